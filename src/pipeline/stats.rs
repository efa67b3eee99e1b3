use serde::Serialize;

use crate::cache::CacheStats;

/// Point-in-time view of the pipeline counters. Rates are percentages.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub total_processed: u64,
    pub successful_transforms: u64,
    pub failed_transforms: u64,
    pub cache_hits: u64,
    pub retries: u64,
    pub fallbacks: u64,
    pub success_rate: f64,
    pub cache_hit_rate: f64,
    pub active_hooks: usize,
    pub error_recovery_methods: usize,
    pub batch_pending: usize,
    pub cache: CacheStats,
}
