use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic pipeline counters, shared by the facade and the retry executor.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub total_processed: AtomicU64,
    pub successful_transforms: AtomicU64,
    pub failed_transforms: AtomicU64,
    pub cache_hits: AtomicU64,
    pub retries: AtomicU64,
    pub fallbacks: AtomicU64,
}

impl PipelineMetrics {
    pub fn record_processed(&self) {
        self.total_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successful_transforms.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_transforms.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Percentage of processed inputs that came back changed.
    pub fn success_rate(&self) -> f64 {
        percentage(
            self.successful_transforms.load(Ordering::Relaxed),
            self.total_processed.load(Ordering::Relaxed),
        )
    }

    pub fn cache_hit_rate(&self) -> f64 {
        percentage(
            self.cache_hits.load(Ordering::Relaxed),
            self.total_processed.load(Ordering::Relaxed),
        )
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    part as f64 / total.max(1) as f64 * 100.0
}
