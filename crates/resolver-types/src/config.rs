//! Persisted configuration records and engine tunables.

use serde::{Deserialize, Serialize};

/// Per-provider configuration as persisted by the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (may be empty when the provider is not yet configured)
    #[serde(default)]
    pub api_key: String,
    /// Whether the instance participates in selection
    #[serde(default)]
    pub enabled: bool,
    /// Priority, lower = more preferred; the UI renumbers densely from 0
    #[serde(default)]
    pub priority: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { api_key: String::new(), enabled: false, priority: 0 }
    }
}

/// What the orchestrator does with a request that arrives during high load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Fail immediately with an overloaded error before any dispatch
    #[default]
    Reject,
    /// Proceed, but cap the fallback chain at the single best candidate and
    /// skip the balance refresh pass
    Degrade,
}

/// Engine tunables, persisted alongside the provider records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of pool workers executing provider calls
    pub pool_size: usize,
    /// Bounded queue capacity; submission fails fast once full
    pub queue_size: usize,
    /// Requests per trailing minute above which load is considered high
    pub high_load_threshold: usize,
    /// Per-attempt timeout in milliseconds
    pub attempt_timeout_ms: u64,
    /// Admission behavior under high load
    pub admission_policy: AdmissionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            queue_size: 100,
            high_load_threshold: 50,
            attempt_timeout_ms: 120_000,
            admission_policy: AdmissionPolicy::Reject,
        }
    }
}
