use std::time::{Duration, Instant};

use super::stats::StatsSnapshot;
use crate::config::constants::{HIGH_PROCESSING_RATE, STATUS_LOG_EVERY, SUCCESS_RATE_DROP_PCT};

#[derive(Debug, Clone, PartialEq)]
pub enum HealthAlert {
    /// Records per second since the previous check.
    HighProcessingRate(f64),
    /// Percentage points lost since the previous check.
    SuccessRateDrop(f64),
}

/// Compares consecutive stats snapshots and warns about throughput spikes and success
/// rate drops.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    last: Option<(Instant, StatsSnapshot)>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, current: StatsSnapshot) -> Vec<HealthAlert> {
        let now = Instant::now();
        let elapsed = self
            .last
            .as_ref()
            .map(|(at, _)| now.duration_since(*at))
            .unwrap_or_default();

        let alerts = self.observe(&current, elapsed);
        self.last = Some((now, current));
        alerts
    }

    fn observe(&self, current: &StatsSnapshot, elapsed: Duration) -> Vec<HealthAlert> {
        let mut alerts = Vec::new();

        if let Some((_, last)) = &self.last {
            let secs = elapsed.as_secs_f64();
            if secs > 0.0 {
                let processed = current.total_processed.saturating_sub(last.total_processed);
                let rate = processed as f64 / secs;

                if rate > HIGH_PROCESSING_RATE {
                    tracing::warn!("High processing rate detected: {:.1} texts/sec", rate);
                    alerts.push(HealthAlert::HighProcessingRate(rate));
                }
            }

            let drop = last.success_rate - current.success_rate;
            if drop > SUCCESS_RATE_DROP_PCT {
                tracing::warn!("Success rate dropped by {:.2}%", drop);
                alerts.push(HealthAlert::SuccessRateDrop(drop));
            }
        }

        if current.total_processed > 0 && current.total_processed % STATUS_LOG_EVERY == 0 {
            tracing::info!(
                processed = current.total_processed,
                success_rate = %format!("{:.2}", current.success_rate),
                cache_hit_rate = %format!("{:.2}", current.cache_hit_rate),
                cache_entries = current.cache.entries,
                "System status"
            );
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;

    fn snapshot(total_processed: u64, success_rate: f64) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: 0,
            total_processed,
            successful_transforms: 0,
            failed_transforms: 0,
            cache_hits: 0,
            retries: 0,
            fallbacks: 0,
            success_rate,
            cache_hit_rate: 0.0,
            active_hooks: 0,
            error_recovery_methods: 0,
            batch_pending: 0,
            cache: CacheStats {
                entries: 0,
                capacity: 1,
                hit_rate: 0.0,
                hits: 0,
                misses: 0,
                evictions: 0,
            },
        }
    }

    #[test]
    fn first_check_never_alerts() {
        let mut monitor = HealthMonitor::new();
        assert!(monitor.check(snapshot(10_000, 0.0)).is_empty());
    }

    #[test]
    fn detects_high_processing_rate() {
        let mut monitor = HealthMonitor::new();
        monitor.last = Some((Instant::now(), snapshot(0, 50.0)));

        let alerts = monitor.observe(&snapshot(500, 50.0), Duration::from_secs(1));
        assert_eq!(alerts, vec![HealthAlert::HighProcessingRate(500.0)]);
    }

    #[test]
    fn detects_success_rate_drop() {
        let mut monitor = HealthMonitor::new();
        monitor.last = Some((Instant::now(), snapshot(10, 80.0)));

        let alerts = monitor.observe(&snapshot(20, 70.0), Duration::from_secs(1));
        assert_eq!(alerts, vec![HealthAlert::SuccessRateDrop(10.0)]);
    }

    #[test]
    fn small_changes_are_quiet() {
        let mut monitor = HealthMonitor::new();
        monitor.last = Some((Instant::now(), snapshot(10, 80.0)));

        let alerts = monitor.observe(&snapshot(50, 77.0), Duration::from_secs(1));
        assert!(alerts.is_empty());
    }
}
