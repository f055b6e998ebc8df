//! Fault-tolerant provider selection: scoring plus circuit breaking.

mod circuit_breaker;
mod selector;

#[cfg(test)]
mod tests;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use selector::ProviderSelector;
