//! # Resolver Core
//!
//! Solve-orchestration engine for Resolver.
//!
//! Given a detected CAPTCHA challenge, the engine picks a solving provider
//! under uncertainty, survives provider outages without cascading failures,
//! bounds resource usage under bursty load, and keeps live per-provider
//! statistics that feed the next selection.
//!
//! ```text
//! resolver-core/src/
//! ├── provider/      # capability trait, registry, statistics, instances
//! ├── selection/     # circuit breaker + scored provider selection
//! ├── dispatch/      # bounded solve pool + high-load detector
//! ├── orchestrator/  # admission → selection → sequential fallback
//! └── settings/      # live tunables + persistence seam
//! ```
//!
//! The traffic-interception layer, the desktop UI, and the concrete vendor
//! HTTP clients live outside this crate; they talk to it through
//! [`SolveOrchestrator`], the [`provider::CaptchaProvider`] trait, and the
//! snapshot types in `resolver-types`.

#![cfg_attr(
    test,
    allow(clippy::panic, clippy::unwrap_used, clippy::float_cmp, clippy::print_stdout)
)]

pub mod dispatch;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod selection;
pub mod settings;
pub mod util;

// Re-export commonly used types
pub use orchestrator::SolveOrchestrator;
pub use provider::{CaptchaProvider, ProviderRegistry, ProviderService, ProviderStatistics};
pub use resolver_types::{
    AdmissionPolicy, CaptchaType, ConfigError, EngineConfig, ProviderConfig, ResolverError,
    SolveError, SolveRequest, SolvedToken,
};
pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsStore};
