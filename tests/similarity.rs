//! Similarity Engine Integration Tests
//!
//! Tests for related-item ranking, the TTL cache and call telemetry.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{add_item, scenario};
use listing_core::config::SimilaritySettings;
use listing_core::{ContentService, FetchOptions, ItemRecord, SiteConfig};
use tempfile::TempDir;

fn config_with_ttl(seconds: u64) -> SiteConfig {
    SiteConfig {
        similarity: SimilaritySettings {
            cache_ttl_seconds: seconds,
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn source(service: &ContentService, slug: &str) -> ItemRecord {
    service
        .fetch_item(slug, &FetchOptions::default())
        .await
        .unwrap()
        .unwrap()
        .meta
}

#[tokio::test]
async fn test_scenario_b_outranks_c() {
    let temp = scenario();
    let service = ContentService::new(temp.path(), SiteConfig::default());
    let a = source(&service, "a").await;

    let similar = service
        .fetch_similar_items(&a, Some(6), &FetchOptions::default(), true)
        .await;

    let slugs: Vec<_> = similar.iter().map(|s| s.item.slug.as_str()).collect();
    assert_eq!(slugs.first(), Some(&"b"));
    assert!(!slugs.contains(&"a"));
    if let Some(pos_c) = slugs.iter().position(|s| *s == "c") {
        assert!(pos_c > 0);
    }
    assert_eq!(similar[0].common_tags, 1);
    assert_eq!(similar[0].common_categories, 1);
}

#[tokio::test]
async fn test_ranking_properties() {
    let temp = scenario();
    let root = temp.path();
    add_item(root, "d", "c1", &["x", "y"], "2024-02-01 00:00");
    add_item(root, "e", "c2", &["y"], "2024-02-02 00:00");
    add_item(root, "f", "c1", &[], "2024-02-03 00:00");
    add_item(root, "g", "c1", &["x", "z"], "2024-02-04 00:00");

    let service = ContentService::new(root, SiteConfig::default());
    let a = source(&service, "a").await;

    for max_results in [1, 2, 3, 10] {
        let similar = service
            .fetch_similar_items(&a, Some(max_results), &FetchOptions::default(), false)
            .await;

        assert!(similar.len() <= max_results);
        assert!(similar.iter().all(|s| s.item.slug != "a"));
        assert!(similar.iter().all(|s| s.score > 0.0 && s.score <= 1.0));
        for pair in similar.windows(2) {
            assert!(pair[0].score + 0.001 >= pair[1].score);
        }
    }

    let best = service
        .fetch_similar_items(&a, Some(1), &FetchOptions::default(), false)
        .await;
    assert_eq!(best[0].item.slug, "d");
    assert_eq!(best[0].common_total(), 3);
}

#[tokio::test]
async fn test_default_result_count_comes_from_config() {
    let temp = scenario();
    for i in 0..10 {
        add_item(temp.path(), &format!("extra{i}"), "c1", &["x"], "2023-01-01 00:00");
    }

    let mut config = SiteConfig::default();
    config.similarity.max_results = 4;
    let service = ContentService::new(temp.path(), config);
    let a = source(&service, "a").await;

    let similar = service
        .fetch_similar_items(&a, None, &FetchOptions::default(), true)
        .await;
    assert_eq!(similar.len(), 4);
}

#[tokio::test]
async fn test_cache_hit_then_expiry() {
    let temp = scenario();
    let service = ContentService::new(temp.path(), config_with_ttl(1));
    let a = source(&service, "a").await;
    let options = FetchOptions::default();

    let first = service.fetch_similar_items(&a, Some(6), &options, true).await;
    let second = service.fetch_similar_items(&a, Some(6), &options, true).await;
    assert_eq!(first, second);

    let metrics = service.similarity_performance_metrics();
    assert_eq!(metrics.total_calls, 2);
    assert_eq!(metrics.cache_hits, 1);
    assert!((metrics.cache_hit_rate - 0.5).abs() < 1e-9);
    assert_eq!(service.similarity_cache_stats().valid_entries, 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(service.similarity_cache_stats().valid_entries, 0);

    let third = service.fetch_similar_items(&a, Some(6), &options, true).await;
    assert_eq!(third, first);
    let metrics = service.similarity_performance_metrics();
    assert_eq!(metrics.total_calls, 3);
    assert_eq!(metrics.cache_hits, 1);
}

#[tokio::test]
async fn test_cache_key_includes_count_and_options() {
    let temp = scenario();
    let service = ContentService::new(temp.path(), SiteConfig::default());
    let a = source(&service, "a").await;

    service.fetch_similar_items(&a, Some(6), &FetchOptions::default(), true).await;
    service.fetch_similar_items(&a, Some(5), &FetchOptions::default(), true).await;
    service
        .fetch_similar_items(&a, Some(6), &FetchOptions::default().with_lang("fr"), true)
        .await;

    assert_eq!(service.similarity_performance_metrics().cache_hits, 0);
    assert_eq!(service.similarity_cache_stats().size, 3);
}

#[tokio::test]
async fn test_cache_bypass_and_empty_results() {
    let temp = scenario();
    let service = ContentService::new(temp.path(), SiteConfig::default());
    let a = source(&service, "a").await;
    let c = source(&service, "c").await;

    service.fetch_similar_items(&a, Some(6), &FetchOptions::default(), false).await;
    service.fetch_similar_items(&a, Some(6), &FetchOptions::default(), false).await;
    assert_eq!(service.similarity_cache_stats().size, 0);
    assert_eq!(service.similarity_performance_metrics().cache_hits, 0);

    // C shares nothing with anyone: empty, and not cached
    let similar = service.fetch_similar_items(&c, Some(6), &FetchOptions::default(), true).await;
    assert!(similar.is_empty());
    assert_eq!(service.similarity_cache_stats().size, 0);
}

#[tokio::test]
async fn test_short_circuits() {
    let temp = scenario();
    let service = ContentService::new(temp.path(), SiteConfig::default());

    let bare = ItemRecord::placeholder("bare");
    assert!(service
        .fetch_similar_items(&bare, None, &FetchOptions::default(), true)
        .await
        .is_empty());

    // Listing failure degrades to no recommendations
    let a = source(&service, "a").await;
    let similar = service
        .fetch_similar_items(&a, None, &FetchOptions::default().with_lang("../x"), true)
        .await;
    assert!(similar.is_empty());

    assert_eq!(service.similarity_performance_metrics().total_calls, 2);
}

#[tokio::test]
async fn test_sweep_runs_on_every_kind_of_call() {
    let temp = scenario();
    let mut config = config_with_ttl(1);
    config.similarity.sweep_probability = 1.0;
    let service = ContentService::new(temp.path(), config);
    let a = source(&service, "a").await;
    let b = source(&service, "b").await;

    service.fetch_similar_items(&a, Some(6), &FetchOptions::default(), true).await;
    service.fetch_similar_items(&b, Some(6), &FetchOptions::default(), true).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    service.fetch_similar_items(&a, Some(5), &FetchOptions::default(), true).await;
    assert_eq!(service.similarity_cache_stats().size, 1);

    // A short-circuited call still sweeps
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let bare = ItemRecord::placeholder("bare");
    service.fetch_similar_items(&bare, None, &FetchOptions::default(), true).await;
    assert_eq!(service.similarity_cache_stats().size, 0);
}

#[tokio::test]
async fn test_cache_hit_also_sweeps() {
    let temp = scenario();
    let mut config = config_with_ttl(1);
    config.similarity.sweep_probability = 1.0;
    let service = ContentService::new(temp.path(), config);
    let a = source(&service, "a").await;

    service.fetch_similar_items(&a, Some(6), &FetchOptions::default(), true).await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    service.fetch_similar_items(&a, Some(5), &FetchOptions::default(), true).await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    // Some(6) has expired, Some(5) is still fresh and answers from cache
    service.fetch_similar_items(&a, Some(5), &FetchOptions::default(), true).await;
    assert_eq!(service.similarity_performance_metrics().cache_hits, 1);
    let stats = service.similarity_cache_stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.expired_entries, 0);
}

#[tokio::test]
async fn test_sweep_disabled_leaves_expired_entries() {
    let temp = scenario();
    let mut config = config_with_ttl(1);
    config.similarity.sweep_probability = 0.0;
    let service = ContentService::new(temp.path(), config);
    let a = source(&service, "a").await;

    service.fetch_similar_items(&a, Some(6), &FetchOptions::default(), true).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let bare = ItemRecord::placeholder("bare");
    service.fetch_similar_items(&bare, None, &FetchOptions::default(), true).await;

    let stats = service.similarity_cache_stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.expired_entries, 1);
}

#[tokio::test]
async fn test_clear_cache_and_metrics() {
    let temp = scenario();
    let service = ContentService::new(temp.path(), SiteConfig::default());
    let a = source(&service, "a").await;

    service.fetch_similar_items(&a, None, &FetchOptions::default(), true).await;
    assert_eq!(service.similarity_cache_stats().size, 1);
    assert_eq!(service.similarity_cache_stats().ttl_seconds, 300);

    service.clear_similarity_cache();
    assert_eq!(service.similarity_cache_stats().size, 0);

    service.fetch_similar_items(&a, None, &FetchOptions::default(), true).await;
    assert_eq!(service.similarity_performance_metrics().cache_hits, 0);

    service.clear_similarity_performance_metrics();
    let metrics = service.similarity_performance_metrics();
    assert_eq!(metrics.total_calls, 0);
    assert_eq!(metrics.average_latency_ms, 0.0);
}

#[tokio::test]
async fn test_services_are_isolated() {
    let temp = scenario();
    let first = ContentService::new(temp.path(), SiteConfig::default());
    let second = ContentService::new(temp.path(), SiteConfig::default());
    let a = source(&first, "a").await;

    first.fetch_similar_items(&a, None, &FetchOptions::default(), true).await;
    second.fetch_similar_items(&a, None, &FetchOptions::default(), true).await;

    assert_eq!(first.similarity_performance_metrics().cache_hits, 0);
    assert_eq!(second.similarity_performance_metrics().cache_hits, 0);
}

#[tokio::test]
async fn test_shared_service_across_tasks() {
    let temp = scenario();
    let service = Arc::new(ContentService::new(temp.path(), SiteConfig::default()));
    let a = source(&service, "a").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let a = a.clone();
        handles.push(tokio::spawn(async move {
            service
                .fetch_similar_items(&a, Some(6), &FetchOptions::default(), true)
                .await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));

    let metrics = service.similarity_performance_metrics();
    assert_eq!(metrics.total_calls, 8);
    assert!(metrics.cache_hits <= 7);
}

#[tokio::test]
async fn test_empty_root_has_no_recommendations() {
    let temp = TempDir::new().unwrap();
    let service = ContentService::new(temp.path(), SiteConfig::default());
    let mut item = ItemRecord::placeholder("lonely");
    item.tags.push(listing_core::EntityRef::new("x", "x"));

    assert!(service
        .fetch_similar_items(&item, None, &FetchOptions::default(), true)
        .await
        .is_empty());
}
