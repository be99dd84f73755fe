//! Core content-store logic.
//!
//! This module contains:
//! - Error: Typed errors for the query API
//! - Safety: Path sanitization and locale/slug validation
//! - Similarity: Related-item scoring and its TTL cache
//! - Metrics: Similarity call telemetry
//! - Service: ContentService, the page layer's entry point

pub mod error;
pub mod metrics;
pub mod safety;
pub mod service;
pub mod similarity;

// Re-export commonly used types
pub use error::{ContentError, Result};
pub use metrics::{PerformanceMetrics, PerformanceSnapshot};
pub use safety::{
    check_path, is_valid_locale, is_valid_slug, safe_read_file, sanitize_filename, validate_path,
};
pub use service::ContentService;
pub use similarity::{
    rank_similar, similarity_score, CacheKey, SimilarityCache, SimilarityCacheStats,
};
