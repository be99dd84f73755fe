//! Related-item ranking and its time-bounded cache.
//!
//! Scores weigh shared tags (0.6) above shared categories (0.4), normalise by
//! the size of the source item's larger list, then compress logarithmically:
//! `score = min(log10(1 + 9 * combined), 1)`.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{EntityRef, FetchOptions, ItemRecord, SimilarItem};

/// Results returned when the caller does not ask for a specific count
pub const DEFAULT_MAX_RESULTS: usize = 6;

/// Lifetime of a cached ranking
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Chance that a call also evicts expired cache entries
pub const DEFAULT_SWEEP_PROBABILITY: f64 = 0.1;

const TAG_WEIGHT: f64 = 0.6;
const CATEGORY_WEIGHT: f64 = 0.4;

/// Scores within this of a tie group's best are ordered by overlap size
const TIE_EPSILON: f64 = 0.001;

/// Lower-cased, trimmed, de-duplicated ids
pub fn normalize(refs: &[EntityRef]) -> Vec<String> {
    let mut seen = HashSet::new();
    refs.iter()
        .map(|r| r.id.trim().to_lowercase())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Score an overlap against a source with `source_tags` tags and
/// `source_categories` categories
pub fn similarity_score(
    source_tags: usize,
    source_categories: usize,
    common_tags: usize,
    common_categories: usize,
) -> f64 {
    let max_total = source_tags.max(source_categories).max(1) as f64;
    let tag_score = common_tags as f64 * TAG_WEIGHT / max_total;
    let category_score = common_categories as f64 * CATEGORY_WEIGHT / max_total;
    let combined = tag_score + category_score;

    ((1.0 + combined * 9.0).ln() / 10f64.ln()).min(1.0)
}

fn count_common(source: &HashSet<String>, candidate: &[EntityRef]) -> usize {
    normalize(candidate)
        .iter()
        .filter(|id| source.contains(*id))
        .count()
}

/// Rank `candidates` against `source`, best first, at most `max_results`.
///
/// The source itself (same slug) and candidates with no overlap are left out.
pub fn rank_similar(source: &ItemRecord, candidates: &[ItemRecord], max_results: usize) -> Vec<SimilarItem> {
    if source.slug.is_empty() || (source.tags.is_empty() && source.category.is_empty()) {
        return Vec::new();
    }

    let source_tags: HashSet<String> = normalize(&source.tags).into_iter().collect();
    let source_categories: HashSet<String> = normalize(&source.category).into_iter().collect();

    let mut ranked: Vec<SimilarItem> = candidates
        .iter()
        .filter(|candidate| candidate.slug != source.slug)
        .filter_map(|candidate| {
            let common_tags = count_common(&source_tags, &candidate.tags);
            let common_categories = count_common(&source_categories, &candidate.category);
            let score = similarity_score(
                source_tags.len(),
                source_categories.len(),
                common_tags,
                common_categories,
            );

            (score > 0.0).then(|| SimilarItem {
                item: candidate.clone(),
                score,
                common_tags,
                common_categories,
            })
        })
        .collect();

    order_ranked(&mut ranked);
    ranked.truncate(max_results);
    ranked
}

/// Sort by score, best first, breaking near-ties by overlap size.
///
/// Each tie group starts at the highest remaining score and takes every
/// following score less than `TIE_EPSILON` below it; within a group, larger
/// `common_tags + common_categories` goes first.
fn order_ranked(ranked: &mut [SimilarItem]) {
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut start = 0;
    while start < ranked.len() {
        let leader = ranked[start].score;
        let end = ranked[start..]
            .iter()
            .position(|s| leader - s.score >= TIE_EPSILON)
            .map_or(ranked.len(), |offset| start + offset);

        ranked[start..end].sort_by(|a, b| {
            b.common_total()
                .cmp(&a.common_total())
                .then_with(|| b.score.total_cmp(&a.score))
        });
        start = end;
    }
}

/// Sort object keys recursively so equal options always serialize equally
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// SHA256 over the canonical JSON form of `options`
pub fn options_hash(options: &FetchOptions) -> String {
    let value = serde_json::to_value(options).unwrap_or(Value::Null);
    let canonical = canonicalize(value).to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache key: source slug, result count and options digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub slug: String,
    pub max_results: usize,
    pub options_hash: String,
}

impl CacheKey {
    pub fn new(slug: &str, max_results: usize, options: &FetchOptions) -> Self {
        Self {
            slug: slug.to_string(),
            max_results,
            options_hash: options_hash(options),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    results: Vec<SimilarItem>,
    stored_at: Instant,
}

/// Point-in-time view of the similarity cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityCacheStats {
    pub size: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub ttl_seconds: u64,
}

/// In-memory TTL cache of rankings; expiry is checked on read and by `sweep`
#[derive(Debug)]
pub struct SimilarityCache {
    entries: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl Default for SimilarityCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl SimilarityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.stored_at.elapsed() < self.ttl
    }

    /// Fresh results for `key`; an expired entry is removed and reported as a miss
    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<SimilarItem>> {
        let fresh = self.entries.get(key).map(|entry| self.is_fresh(entry))?;
        if fresh {
            self.entries.get(key).map(|entry| entry.results.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    /// Store non-empty results; empty rankings are never cached
    pub fn insert(&mut self, key: CacheKey, results: Vec<SimilarItem>) -> bool {
        if results.is_empty() {
            return false;
        }
        self.entries.insert(
            key,
            CacheEntry {
                results,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Drop expired entries, returning how many were removed
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> SimilarityCacheStats {
        let valid_entries = self.entries.values().filter(|e| self.is_fresh(e)).count();
        SimilarityCacheStats {
            size: self.entries.len(),
            valid_entries,
            expired_entries: self.entries.len() - valid_entries,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}
