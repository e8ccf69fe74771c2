use serde::Serialize;

/// Running counters over completed analyses.
#[derive(Debug, Default, Clone)]
pub struct PerformanceTracker {
    search_count: u64,
    average_response_time_ms: f64,
}

/// Snapshot returned by `get_performance_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub search_count: u64,
    pub average_response_time_ms: f64,
    pub cache_size: usize,
    /// Cache hits over lookups, 0 before any lookup.
    pub cache_hit_rate: f64,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed analysis.
    pub fn update_performance_metrics(&mut self, elapsed_ms: u64) {
        self.search_count += 1;
        let n = self.search_count as f64;
        self.average_response_time_ms += (elapsed_ms as f64 - self.average_response_time_ms) / n;
    }

    pub fn search_count(&self) -> u64 {
        self.search_count
    }

    pub fn average_response_time_ms(&self) -> f64 {
        self.average_response_time_ms
    }

    pub fn stats(&self, cache_size: usize, hits: u64, misses: u64) -> PerformanceStats {
        let lookups = hits + misses;
        let cache_hit_rate = if lookups == 0 {
            0.0
        } else {
            (hits as f64 / lookups as f64).clamp(0.0, 1.0)
        };

        PerformanceStats {
            search_count: self.search_count,
            average_response_time_ms: self.average_response_time_ms,
            cache_size,
            cache_hit_rate,
        }
    }
}
