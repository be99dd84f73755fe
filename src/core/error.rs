//! Error types shared by the content store.
//!
//! Input-validation failures (`InvalidPath`, `InvalidLocale`, `InvalidSlug`)
//! are fatal and always reach the caller. I/O errors carry the offending path;
//! `is_not_found` separates "missing file" (non-fatal) from everything else.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the content store's query API
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid locale: {0:?}")]
    InvalidLocale(String),

    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ContentError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error is a plain "file or directory does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// True for errors caused by untrusted caller input
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. } | Self::InvalidLocale(_) | Self::InvalidSlug(_)
        )
    }
}

pub type Result<T, E = ContentError> = std::result::Result<T, E>;
