//! Read-only snapshot models for the UI and IPC.
//!
//! The engine exposes its live state exclusively through these serializable
//! views; nothing here holds a reference back into engine internals.

use serde::{Deserialize, Serialize};

/// Point-in-time view of one provider's rolling statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Total solve attempts recorded
    pub total_requests: u64,
    /// Attempts that produced a token
    pub successful_requests: u64,
    /// Attempts that failed
    pub failed_requests: u64,
    /// Success rate in percent (0 when no attempts recorded)
    pub success_rate: f64,
    /// Mean solve time of successes in milliseconds (0 when no successes)
    pub avg_solve_time_ms: f64,
}

/// Point-in-time view of one configured provider instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    /// Stable provider identifier
    pub id: String,
    /// Human-readable provider name
    pub display_name: String,
    /// API key masked for display (middle characters hidden)
    pub masked_api_key: String,
    pub enabled: bool,
    /// Lower = more preferred
    pub priority: u32,
    /// Last known account balance; `None` when never fetched
    pub balance: Option<f64>,
    pub statistics: StatisticsSnapshot,
    /// Consecutive failures tracked by the instance's circuit breaker
    pub consecutive_failures: u32,
    /// Whether the circuit breaker currently bypasses this instance
    pub circuit_open: bool,
}

/// Point-in-time view of the engine as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub providers: Vec<ProviderSnapshot>,
    /// Requests registered in the trailing 60 seconds
    pub requests_last_minute: usize,
    /// Whether the high-load threshold is currently exceeded
    pub high_load: bool,
    /// Pool workers currently executing a task
    pub active_tasks: usize,
    /// Tasks accepted but not yet executing
    pub queued_tasks: usize,
}
