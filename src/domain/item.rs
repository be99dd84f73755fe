//! Item records and category/tag references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Description used for records that could not be loaded
pub const PLACEHOLDER_DESCRIPTION: &str = "Content temporarily unavailable";

/// A category or tag reference as written in item YAML.
///
/// Items may reference an entity by bare id (`tags: [rust]`) or inline
/// (`category: { id: cli, name: "CLI tools" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref {
    Id(String),
    Named {
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl Ref {
    /// Normalize into an `{id, name}` pair; a bare id doubles as its name
    pub fn into_entity(self) -> EntityRef {
        match self {
            Ref::Id(id) => EntityRef {
                name: id.clone(),
                id,
            },
            Ref::Named { id, name } => EntityRef {
                name: name.unwrap_or_else(|| id.clone()),
                id,
            },
        }
    }
}

/// One reference or a list of them (`category: x` vs `category: [x, y]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefList {
    Many(Vec<Ref>),
    One(Ref),
}

impl Default for RefList {
    fn default() -> Self {
        RefList::Many(Vec::new())
    }
}

impl RefList {
    pub fn into_vec(self) -> Vec<Ref> {
        match self {
            RefList::Many(refs) => refs,
            RefList::One(r) => vec![r],
        }
    }
}

/// A resolved category or tag attached to an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A listed item, built fresh from its YAML files on every query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Directory/file stem, `^[a-zA-Z0-9_-]+$`
    pub slug: String,

    pub name: String,

    pub description: String,

    pub source_url: String,

    #[serde(default)]
    pub category: Vec<EntityRef>,

    #[serde(default)]
    pub tags: Vec<EntityRef>,

    #[serde(default)]
    pub featured: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    /// Raw `yyyy-MM-dd HH:mm` string from the file
    pub updated_at: String,

    /// `updated_at` parsed as UTC
    pub last_updated: DateTime<Utc>,

    /// Inline body used when no `.md`/`.mdx` file exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,

    /// Opaque promotion data, passed through to the page layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<serde_yaml::Value>,

    /// Set when the record stands in for a file that failed to load
    #[serde(default)]
    pub placeholder: bool,
}

impl ItemRecord {
    /// Minimal stand-in for an item whose files could not be loaded
    pub fn placeholder(slug: &str) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.to_string(),
            name: display_name(slug),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            source_url: "#".to_string(),
            category: Vec::new(),
            tags: Vec::new(),
            featured: false,
            icon_url: None,
            updated_at: now.format("%Y-%m-%d %H:%M").to_string(),
            last_updated: now,
            markdown: None,
            promo_code: None,
            placeholder: true,
        }
    }

    pub fn has_category(&self, id: &str) -> bool {
        self.category.iter().any(|c| c.id == id)
    }

    pub fn has_tag(&self, id: &str) -> bool {
        self.tags.iter().any(|t| t.id == id)
    }
}

/// `my-cool_item` -> `My Cool Item`
fn display_name(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A single item together with its body content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetail {
    pub meta: ItemRecord,

    /// Markdown/MDX body, if any source provided one
    pub content: Option<String>,
}
