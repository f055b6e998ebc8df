//! Solve-path errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One failed attempt inside an exhausted fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFailure {
    /// Provider that was tried
    pub provider_id: String,
    /// Last error observed for that provider, as a display string
    pub error: String,
}

/// Errors that can occur while orchestrating a solve request.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum SolveError {
    /// The detector emitted a type code the engine does not recognize
    #[error("Unsupported CAPTCHA type code: {code}")]
    UnsupportedType { code: String },

    /// Selection produced an empty candidate list
    #[error("No eligible provider for CAPTCHA type: {captcha_type}")]
    NoEligibleProvider { captcha_type: String },

    /// Admission control rejected the request (trailing-minute rate above threshold)
    #[error("System overloaded: {requests_last_minute} requests in the last minute (threshold {threshold})")]
    Overloaded { requests_last_minute: usize, threshold: usize },

    /// The pool queue was full at submission time
    #[error("Solve pool saturated")]
    PoolSaturated,

    /// A provider call failed (vendor rejection, network error, bad response)
    #[error("Provider {provider_id} failed: {message}")]
    Provider { provider_id: String, message: String },

    /// A provider call neither completed nor was cancelled within its timeout
    #[error("Provider {provider_id} timed out after {timeout_ms}ms")]
    Timeout { provider_id: String, timeout_ms: u64 },

    /// The attempt was cancelled before completion; never attributed to the provider
    #[error("Solve attempt cancelled")]
    Cancelled,

    /// The pool is shutting down and no longer accepts work
    #[error("Engine is shutting down")]
    ShuttingDown,

    /// Every eligible candidate was tried and failed
    #[error("All providers failed for {captcha_type} ({} tried)", attempts.len())]
    AllProvidersFailed { captcha_type: String, attempts: Vec<AttemptFailure> },
}

impl SolveError {
    /// Whether this error is attributable to the provider that produced it
    /// and should be recorded into its statistics and circuit breaker.
    ///
    /// Saturation and cancellation are engine conditions, not provider
    /// faults, and must never penalize a provider.
    pub fn penalizes_provider(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Timeout { .. })
    }

    /// Whether the caller should treat this as backpressure rather than a
    /// provider failure.
    pub fn is_overload(&self) -> bool {
        matches!(self, Self::Overloaded { .. } | Self::PoolSaturated)
    }
}
