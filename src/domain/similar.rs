//! Related-item results.

use serde::{Deserialize, Serialize};

use super::item::ItemRecord;

/// A candidate item ranked against a source item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItem {
    pub item: ItemRecord,

    /// Compressed overlap score in `(0, 1]`
    pub score: f64,

    pub common_tags: usize,

    pub common_categories: usize,
}

impl SimilarItem {
    pub fn common_total(&self) -> usize {
        self.common_tags + self.common_categories
    }
}
