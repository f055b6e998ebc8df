//! Typed error definitions for Resolver.
//!
//! This module provides a structured error hierarchy with specific error
//! types for different domains. All errors are designed to be:
//!
//! - **Serializable** for UI/IPC responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants
//! - **Composable** via thiserror derive macros

mod config;
mod solve;

pub use config::ConfigError;
pub use solve::{AttemptFailure, SolveError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type that wraps all domain-specific errors.
///
/// Use this when a single error type must represent any Resolver error,
/// e.g. during engine bootstrap where both configuration loading and solve
/// plumbing can fail.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "domain", content = "error")]
pub enum ResolverError {
    /// Wraps a solve-path error
    #[error("Solve error: {0}")]
    Solve(#[from] SolveError),

    /// Wraps a configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Standard Result type using ResolverError.
pub type Result<T> = std::result::Result<T, ResolverError>;
