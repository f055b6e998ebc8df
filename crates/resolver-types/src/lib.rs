//! # Resolver Types
//!
//! Core types, config records, and error definitions for the Resolver
//! solve-orchestration engine.
//!
//! This crate provides the foundational type system for the Resolver
//! ecosystem:
//!
//! - **`captcha`** - Canonical CAPTCHA type codes and alias normalization
//! - **`solve`** - Solve request/result records
//! - **`config`** - Persisted provider and engine configuration
//! - **`snapshot`** - Read-only statistics views for UI/IPC
//! - **`error`** - Typed error hierarchy for solving and configuration
//!
//! ## Architecture Role
//!
//! `resolver-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!     resolver-types (this crate)
//!            │
//!            ▼
//!     resolver-core
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for API/IPC
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod captcha;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod solve;

// Re-export error types for convenience
pub use error::{AttemptFailure, ConfigError, ResolverError, Result, SolveError};

// Re-export core model types
pub use captcha::CaptchaType;
pub use config::{AdmissionPolicy, EngineConfig, ProviderConfig};
pub use snapshot::{EngineSnapshot, ProviderSnapshot, StatisticsSnapshot};
pub use solve::{SolveRequest, SolvedToken};
