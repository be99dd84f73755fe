//! Call counters for the similarity engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cumulative counters; the latency is a plain running mean
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    total_calls: u64,
    cache_hits: u64,
    average_latency_ms: f64,
}

/// Read-only copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub total_calls: u64,
    pub cache_hits: u64,
    /// `cache_hits / total_calls`, 0 before the first call
    pub cache_hit_rate: f64,
    pub average_latency_ms: f64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call
    pub fn record(&mut self, latency: Duration, cache_hit: bool) {
        self.total_calls += 1;
        if cache_hit {
            self.cache_hits += 1;
        }
        let sample = latency.as_secs_f64() * 1000.0;
        self.average_latency_ms += (sample - self.average_latency_ms) / self.total_calls as f64;
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        let cache_hit_rate = if self.total_calls == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_calls as f64
        };
        PerformanceSnapshot {
            total_calls: self.total_calls,
            cache_hits: self.cache_hits,
            cache_hit_rate,
            average_latency_ms: self.average_latency_ms,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
