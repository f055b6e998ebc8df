//! Live engine tunables and the persistence seam.
//!
//! [`Settings`] holds the runtime-adjustable knobs behind atomics so
//! operators can retune without a restart: the high-load detector re-reads
//! its threshold on every query rather than caching it at construction.
//! Pool size and queue size are applied when the pool is (re)built.

mod store;

pub use store::{JsonFileStore, MemoryStore, SettingsStore, StoredSettings};

use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};

use resolver_types::{AdmissionPolicy, EngineConfig};

/// Live view of the engine tunables.
#[derive(Debug)]
pub struct Settings {
    pool_size: AtomicUsize,
    queue_size: AtomicUsize,
    high_load_threshold: AtomicUsize,
    attempt_timeout_ms: AtomicU64,
    admission_policy: AtomicU8,
}

impl Settings {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pool_size: AtomicUsize::new(config.pool_size),
            queue_size: AtomicUsize::new(config.queue_size),
            high_load_threshold: AtomicUsize::new(config.high_load_threshold),
            attempt_timeout_ms: AtomicU64::new(config.attempt_timeout_ms),
            admission_policy: AtomicU8::new(Self::policy_to_u8(config.admission_policy)),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size.load(Ordering::Relaxed)
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size.load(Ordering::Relaxed)
    }

    pub fn high_load_threshold(&self) -> usize {
        self.high_load_threshold.load(Ordering::Relaxed)
    }

    pub fn set_high_load_threshold(&self, threshold: usize) {
        self.high_load_threshold.store(threshold, Ordering::Relaxed);
    }

    pub fn attempt_timeout_ms(&self) -> u64 {
        self.attempt_timeout_ms.load(Ordering::Relaxed)
    }

    pub fn set_attempt_timeout_ms(&self, timeout_ms: u64) {
        self.attempt_timeout_ms.store(timeout_ms, Ordering::Relaxed);
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        match self.admission_policy.load(Ordering::Relaxed) {
            1 => AdmissionPolicy::Degrade,
            _ => AdmissionPolicy::Reject,
        }
    }

    pub fn set_admission_policy(&self, policy: AdmissionPolicy) {
        self.admission_policy.store(Self::policy_to_u8(policy), Ordering::Relaxed);
    }

    /// Apply a full config record in place (live retune).
    pub fn apply(&self, config: &EngineConfig) {
        self.pool_size.store(config.pool_size, Ordering::Relaxed);
        self.queue_size.store(config.queue_size, Ordering::Relaxed);
        self.high_load_threshold.store(config.high_load_threshold, Ordering::Relaxed);
        self.attempt_timeout_ms.store(config.attempt_timeout_ms, Ordering::Relaxed);
        self.admission_policy
            .store(Self::policy_to_u8(config.admission_policy), Ordering::Relaxed);
    }

    /// Current values as a persistable record.
    pub fn to_config(&self) -> EngineConfig {
        EngineConfig {
            pool_size: self.pool_size(),
            queue_size: self.queue_size(),
            high_load_threshold: self.high_load_threshold(),
            attempt_timeout_ms: self.attempt_timeout_ms(),
            admission_policy: self.admission_policy(),
        }
    }

    fn policy_to_u8(policy: AdmissionPolicy) -> u8 {
        match policy {
            AdmissionPolicy::Reject => 0,
            AdmissionPolicy::Degrade => 1,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
