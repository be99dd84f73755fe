//! Categories and tags with per-query reference counts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::item::EntityRef;

/// Which classification a collection holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Category,
    Tag,
}

impl CollectionKind {
    /// Directory and file stem used on disk (`categories/categories.yml`)
    pub fn stem(&self) -> &'static str {
        match self {
            CollectionKind::Category => "categories",
            CollectionKind::Tag => "tags",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionKind::Category => write!(f, "category"),
            CollectionKind::Tag => write!(f, "tag"),
        }
    }
}

/// One category or tag and how many listed items reference it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub count: usize,
}

/// An ordered id -> entry map, rebuilt for every listing call
#[derive(Debug, Clone)]
pub struct Collection {
    kind: CollectionKind,
    entries: Vec<CollectionEntry>,
    index: HashMap<String, usize>,
}

impl Collection {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Add an entry, or overwrite the name of an existing one
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let name = name.into();
        match self.index.get(&id) {
            Some(&pos) => self.entries[pos].name = name,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push(CollectionEntry { id, name, count: 0 });
            }
        }
    }

    /// Rename an existing entry; unknown ids are ignored
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.index.get(id) {
            Some(&pos) => {
                self.entries[pos].name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&CollectionEntry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    /// Resolve an item's reference, counting it.
    ///
    /// Unknown ids are added with the reference's own name, so items stay
    /// renderable when the master list lags behind the content files.
    pub fn populate(&mut self, reference: &EntityRef) -> EntityRef {
        let pos = match self.index.get(&reference.id) {
            Some(&pos) => pos,
            None => {
                self.insert(reference.id.clone(), reference.name.clone());
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[pos];
        entry.count += 1;
        EntityRef::new(entry.id.clone(), entry.name.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CollectionEntry> {
        self.entries
    }
}
