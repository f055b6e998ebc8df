//! Per-provider rolling counters.

use std::sync::atomic::{AtomicU64, Ordering};

use resolver_types::StatisticsSnapshot;

/// Rolling solve statistics for one provider instance.
///
/// Counters only grow (until an explicit [`reset`](Self::reset)) and are safe
/// under concurrent increments from multiple attempts in flight. Updates are
/// immediately visible to the next selection pass, which scores on the
/// current values rather than a stale snapshot.
#[derive(Debug, Default)]
pub struct ProviderStatistics {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_solve_time_ms: AtomicU64,
}

impl ProviderStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful solve attempt and its duration.
    pub fn record_success(&self, solve_time_ms: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
        self.total_solve_time_ms.fetch_add(solve_time_ms, Ordering::Relaxed);
    }

    /// Record a failed solve attempt.
    pub fn record_failure(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Success rate as a percentage, 0.0 when nothing has been recorded.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.successful_requests.load(Ordering::Relaxed) as f64 / total as f64 * 100.0
    }

    /// Mean solve time of successes in milliseconds, 0.0 with no successes.
    pub fn avg_solve_time_ms(&self) -> f64 {
        let successful = self.successful_requests.load(Ordering::Relaxed);
        if successful == 0 {
            return 0.0;
        }
        self.total_solve_time_ms.load(Ordering::Relaxed) as f64 / successful as f64
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn successful_requests(&self) -> u64 {
        self.successful_requests.load(Ordering::Relaxed)
    }

    pub fn failed_requests(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }

    /// Zero all counters.
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.total_solve_time_ms.store(0, Ordering::Relaxed);
    }

    /// Serializable point-in-time view for the UI.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            total_requests: self.total_requests(),
            successful_requests: self.successful_requests(),
            failed_requests: self.failed_requests(),
            success_rate: self.success_rate(),
            avg_solve_time_ms: self.avg_solve_time_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn empty_statistics_are_zero() {
        let stats = ProviderStatistics::new();
        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.avg_solve_time_ms(), 0.0);
    }

    #[test]
    fn totals_always_add_up() {
        let stats = ProviderStatistics::new();
        stats.record_success(1000);
        stats.record_success(2000);
        stats.record_failure();

        assert_eq!(stats.total_requests(), 3);
        assert_eq!(stats.successful_requests() + stats.failed_requests(), 3);
        assert!((stats.success_rate() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn avg_solve_time_is_exact_mean_of_successes() {
        let stats = ProviderStatistics::new();
        stats.record_success(500);
        stats.record_success(1500);
        stats.record_failure();
        stats.record_failure();

        // Failures never move the average
        assert_eq!(stats.avg_solve_time_ms(), 1000.0);
    }

    #[test]
    fn avg_solve_time_zero_without_successes() {
        let stats = ProviderStatistics::new();
        stats.record_failure();
        stats.record_failure();
        assert_eq!(stats.avg_solve_time_ms(), 0.0);
    }

    #[test]
    fn reset_zeroes_everything() {
        let stats = ProviderStatistics::new();
        stats.record_success(1234);
        stats.record_failure();
        stats.reset();

        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.successful_requests(), 0);
        assert_eq!(stats.failed_requests(), 0);
        assert_eq!(stats.avg_solve_time_ms(), 0.0);
    }

    #[test]
    fn concurrent_increments_do_not_lose_updates() {
        let stats = Arc::new(ProviderStatistics::new());

        let mut handles = vec![];
        for _ in 0..8 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    s.record_success(10);
                    s.record_failure();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.total_requests(), 16_000);
        assert_eq!(stats.successful_requests(), 8_000);
        assert_eq!(stats.failed_requests(), 8_000);
        assert_eq!(stats.avg_solve_time_ms(), 10.0);
        assert_eq!(stats.success_rate(), 50.0);
    }
}
