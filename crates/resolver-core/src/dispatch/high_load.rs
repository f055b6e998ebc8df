//! Sliding-window request-rate detection.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::warn;

use crate::settings::Settings;

const WINDOW: Duration = Duration::from_secs(60);

/// Counts solve requests over the trailing minute and flags high load when
/// the count strictly exceeds the configured threshold.
///
/// The threshold is read from [`Settings`] on every query, so a live retune
/// takes effect immediately. Timestamps are pruned lazily on access; the
/// detector does no background work.
pub struct HighLoadDetector {
    settings: Arc<Settings>,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl HighLoadDetector {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings, timestamps: Mutex::new(VecDeque::new()) }
    }

    /// Record one incoming solve request at the current instant.
    pub fn register_request(&self) {
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock();
        Self::prune(&mut timestamps, now);
        timestamps.push_back(now);
    }

    /// Requests observed within the trailing window.
    pub fn requests_in_last_minute(&self) -> usize {
        let mut timestamps = self.timestamps.lock();
        Self::prune(&mut timestamps, Instant::now());
        timestamps.len()
    }

    /// True when the windowed count strictly exceeds the threshold.
    /// A count equal to the threshold is still normal load.
    pub fn is_high_load(&self) -> bool {
        let threshold = self.settings.high_load_threshold();
        let count = self.requests_in_last_minute();
        let high = count > threshold;
        if high {
            warn!(count, threshold, "High load detected");
        }
        high
    }

    /// Lifecycle hook matching the pool's; the detector runs no background
    /// work, so there is nothing to stop.
    pub fn shutdown(&self) {}

    fn prune(timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) > WINDOW {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}
