//! The capability contract every solving vendor integration implements.

use async_trait::async_trait;
use resolver_types::{CaptchaType, SolveError, SolveRequest};

/// A third-party CAPTCHA solving service.
///
/// New vendors are added by implementing this trait and registering an
/// instance with [`super::ProviderRegistry`]; selection and orchestration
/// never change. The engine assumes nothing about the wire protocol behind
/// these calls.
#[async_trait]
pub trait CaptchaProvider: Send + Sync {
    /// Stable identifier, e.g. `"twocaptcha"`.
    fn id(&self) -> &str;

    /// Human-readable name for tables and logs.
    fn display_name(&self) -> &str;

    /// CAPTCHA types this vendor can solve.
    fn supported_types(&self) -> &[CaptchaType];

    /// Pure predicate over an API key's *format*; no network access.
    fn is_valid_key_format(&self, api_key: &str) -> bool;

    /// Submit a challenge and wait for the solved token.
    async fn solve(&self, request: &SolveRequest) -> Result<String, SolveError>;

    /// Fetch the account balance for the given key.
    async fn fetch_balance(&self, api_key: &str) -> Result<f64, SolveError>;
}
