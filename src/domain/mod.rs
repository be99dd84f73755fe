//! Domain types for the content store.
//!
//! This module contains the core data structures:
//! - Item: Listed records and their category/tag references
//! - Collection: Categories and tags with live counts
//! - Listing: Query options and listing results
//! - Similar: Related-item rankings

pub mod collection;
pub mod item;
pub mod listing;
pub mod similar;

// Re-export commonly used types
pub use collection::{Collection, CollectionEntry, CollectionKind};
pub use item::{EntityRef, ItemDetail, ItemRecord, Ref, RefList, PLACEHOLDER_DESCRIPTION};
pub use listing::{FetchOptions, ItemListing};
pub use similar::SimilarItem;
