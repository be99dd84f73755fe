//! Query entry point for the page layer.
//!
//! `ContentService` owns the similarity cache and call metrics, so each
//! process (or test) constructs its own instance instead of sharing globals.
//! Both are behind mutexes; a service can be shared across tasks via `Arc`.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result as AnyResult;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::{load_site_config, SiteConfig};
use crate::domain::{FetchOptions, ItemDetail, ItemListing, ItemRecord, SimilarItem};
use crate::library::Catalog;

use super::error::Result;
use super::metrics::{PerformanceMetrics, PerformanceSnapshot};
use super::similarity::{rank_similar, CacheKey, SimilarityCache, SimilarityCacheStats};

/// Content store plus related-items engine for one content root
pub struct ContentService {
    catalog: Catalog,
    config: SiteConfig,
    cache: Mutex<SimilarityCache>,
    metrics: Mutex<PerformanceMetrics>,
}

impl ContentService {
    /// Create a service with an already loaded config
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
        let catalog = Catalog::new(root, config.default_locale.clone());
        let cache = SimilarityCache::new(config.similarity.cache_ttl());
        Self {
            catalog,
            config,
            cache: Mutex::new(cache),
            metrics: Mutex::new(PerformanceMetrics::new()),
        }
    }

    /// Create a service, reading `<root>/config.yml` if present
    pub async fn open(root: impl Into<PathBuf>) -> AnyResult<Self> {
        let root = root.into();
        let config = load_site_config(&root).await?;
        info!(root = %root.display(), locale = %config.default_locale, "Opened content root");
        Ok(Self::new(root, config))
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub async fn fetch_items(&self, options: &FetchOptions) -> Result<ItemListing> {
        self.catalog.fetch_items(options).await
    }

    pub async fn fetch_item(&self, slug: &str, options: &FetchOptions) -> Result<Option<ItemDetail>> {
        self.catalog.fetch_item(slug, options).await
    }

    pub async fn fetch_by_category(&self, category: &str, options: &FetchOptions) -> Result<ItemListing> {
        self.catalog.fetch_by_category(category, options).await
    }

    pub async fn fetch_by_tag(&self, tag: &str, options: &FetchOptions) -> Result<ItemListing> {
        self.catalog.fetch_by_tag(tag, options).await
    }

    pub async fn fetch_by_category_and_tag(
        &self,
        category: &str,
        tag: &str,
        options: &FetchOptions,
    ) -> Result<ItemListing> {
        self.catalog
            .fetch_by_category_and_tag(category, tag, options)
            .await
    }

    /// Items most related to `source`, best first.
    ///
    /// `max_results` defaults to the configured count. Any failure to list
    /// items yields an empty ranking rather than an error. Every call counts
    /// toward telemetry and may sweep expired cache entries.
    #[instrument(skip(self, source, options), fields(slug = %source.slug))]
    pub async fn fetch_similar_items(
        &self,
        source: &ItemRecord,
        max_results: Option<usize>,
        options: &FetchOptions,
        use_cache: bool,
    ) -> Vec<SimilarItem> {
        let started = Instant::now();
        let max_results = max_results.unwrap_or(self.config.similarity.max_results);

        let (results, cache_hit) = self.rank_or_reuse(source, max_results, options, use_cache).await;

        self.maybe_sweep();
        self.record_call(started, cache_hit);
        results
    }

    /// Ranking for `source`, and whether it came from the cache
    async fn rank_or_reuse(
        &self,
        source: &ItemRecord,
        max_results: usize,
        options: &FetchOptions,
        use_cache: bool,
    ) -> (Vec<SimilarItem>, bool) {
        if source.slug.is_empty() || (source.tags.is_empty() && source.category.is_empty()) {
            return (Vec::new(), false);
        }

        let key = use_cache.then(|| CacheKey::new(&source.slug, max_results, options));
        if let Some(key) = &key {
            let cached = self.cache.lock().get(key);
            if let Some(results) = cached {
                debug!(results = results.len(), "Similarity cache hit");
                return (results, true);
            }
        }

        let listing = match self.catalog.fetch_items(options).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(error = %e, "Cannot list items for similarity ranking");
                return (Vec::new(), false);
            }
        };

        let results = rank_similar(source, &listing.items, max_results);
        if let Some(key) = key {
            self.cache.lock().insert(key, results.clone());
        }
        (results, false)
    }

    fn record_call(&self, started: Instant, cache_hit: bool) {
        self.metrics.lock().record(started.elapsed(), cache_hit);
    }

    /// Evict expired entries on a random subset of calls
    fn maybe_sweep(&self) {
        let probability = self.config.similarity.sweep_probability.clamp(0.0, 1.0);
        if rand::random_bool(probability) {
            let removed = self.cache.lock().sweep();
            if removed > 0 {
                debug!(removed, "Swept expired similarity entries");
            }
        }
    }

    pub fn similarity_cache_stats(&self) -> SimilarityCacheStats {
        self.cache.lock().stats()
    }

    pub fn clear_similarity_cache(&self) {
        self.cache.lock().clear();
    }

    pub fn similarity_performance_metrics(&self) -> PerformanceSnapshot {
        self.metrics.lock().snapshot()
    }

    pub fn clear_similarity_performance_metrics(&self) {
        self.metrics.lock().reset();
    }
}
