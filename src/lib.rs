//! listing-core - Content store and similarity engine
//!
//! Loads a directory of YAML/Markdown item records (with optional per-locale
//! overlays), indexes them by category and tag with live counts, and ranks
//! related items for recommendations.
//!
//! # Architecture
//!
//! Nothing is persisted between calls:
//! - Every listing re-reads the content tree and rebuilds its indexes
//! - Every path is checked against the content root before it is read
//! - Related-item rankings are cached in memory for a fixed TTL
//!
//! # Modules
//!
//! - `core`: Engine logic (Safety, Similarity, Metrics, ContentService)
//! - `domain`: Data structures (ItemRecord, Collection, SimilarItem)
//! - `library`: Filesystem loaders (record parser, collections, Catalog)
//! - `config`: Content root and `config.yml` handling
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # List everything in a category
//! listing --root ./.content items --category cli
//!
//! # Show an item in French
//! listing --lang fr show ripgrep
//!
//! # Related items
//! listing similar ripgrep -n 4
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use crate::config::SiteConfig;
pub use crate::core::{ContentError, ContentService, PerformanceSnapshot, SimilarityCacheStats};
pub use domain::{
    CollectionEntry, EntityRef, FetchOptions, ItemDetail, ItemListing, ItemRecord, SimilarItem,
};
pub use library::Catalog;
