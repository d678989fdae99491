use serde::{Deserialize, Serialize};

use crate::config::RedactedConfig;

/// Queries slower than this are counted and announced as slow.
pub const SLOW_QUERY_THRESHOLD_MS: f64 = 150.0;

/// Live statistics aggregate, mutated by the pool's execution path right
/// after each completed attempt.
///
/// `average_time_ms` is maintained only by the incremental (Welford) update
/// over successful durations. It is never recomputed from `total_time_ms`;
/// keeping exactly one update path avoids drift between the two.
#[derive(Debug, Default, Clone)]
pub struct PoolStats {
    pub total_queries: u64,
    pub slow_queries: u64,
    pub failed_queries: u64,
    pub total_time_ms: f64,
    pub average_time_ms: f64,
}

impl PoolStats {
    /// Fold one successful query duration into the aggregate. Returns whether
    /// the query crossed the slow threshold.
    pub fn record_success(&mut self, duration_ms: f64) -> bool {
        self.total_queries += 1;
        self.total_time_ms += duration_ms;
        // n is at least 1 here.
        let n = self.total_queries as f64;
        self.average_time_ms += (duration_ms - self.average_time_ms) / n;

        let slow = duration_ms > SLOW_QUERY_THRESHOLD_MS;
        if slow {
            self.slow_queries += 1;
        }
        slow
    }

    /// Count one failed attempt. Failed durations never reach the average.
    pub fn record_failure(&mut self) {
        self.failed_queries += 1;
    }
}

/// Point-in-time copy of the aggregate plus readiness and a redacted config,
/// returned by [`crate::pool::ConnectionPool::stats`]. O(1), no recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_queries: u64,
    pub slow_queries: u64,
    pub failed_queries: u64,
    pub total_time_ms: f64,
    pub average_time_ms: f64,
    pub ready: bool,
    pub config: RedactedConfig,
}
