//! Provider capability contract and per-instance runtime state.

mod descriptor;
mod registry;
mod service;
mod statistics;

pub use descriptor::CaptchaProvider;
pub use registry::ProviderRegistry;
pub use service::{ProviderService, ServiceView};
pub use statistics::ProviderStatistics;
