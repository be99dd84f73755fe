//! Query options and listing results.

use serde::{Deserialize, Serialize};

use super::collection::CollectionEntry;
use super::item::ItemRecord;

/// Options accepted by every listing query
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Requested locale; `None` or the default locale means no overlay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Order returned tags by name instead of master-list order
    #[serde(default)]
    pub sort_tags: bool,
}

impl FetchOptions {
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_sorted_tags(mut self) -> Self {
        self.sort_tags = true;
        self
    }
}

/// Result of a listing query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemListing {
    pub total: usize,
    pub items: Vec<ItemRecord>,
    pub categories: Vec<CollectionEntry>,
    pub tags: Vec<CollectionEntry>,
}

impl ItemListing {
    pub fn category(&self, id: &str) -> Option<&CollectionEntry> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn tag(&self, id: &str) -> Option<&CollectionEntry> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.slug.as_str()).collect()
    }
}
