//! Filesystem-backed content library.
//!
//! # Storage Layout
//!
//! ```text
//! <root>/
//! ├── config.yml                     # Site settings (optional)
//! ├── categories/categories.yml      # [{id, name}] (or <root>/categories.yml)
//! ├── categories/categories.fr.yml   # Name translations by id (optional)
//! ├── tags/tags.yml                  # [{id, name}] (or <root>/tags.yml)
//! └── data/
//!     └── <slug>/
//!         ├── <slug>.yml             # Item record
//!         ├── <slug>.fr.yml          # Locale overlay (optional)
//!         └── <slug>.mdx | .md       # Body, optionally <slug>.fr.mdx
//! ```

pub mod catalog;
pub mod collection;
pub mod record;

pub use catalog::Catalog;
pub use collection::read_collection;
pub use record::{parse_item, parse_item_or_placeholder, parse_translation, ParseError};
