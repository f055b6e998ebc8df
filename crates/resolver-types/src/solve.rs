//! Solve request/result records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::captcha::CaptchaType;

/// A fully-resolved request handed to a provider implementation.
///
/// Site parameters beyond the site key and page URL (action name, enterprise
/// flags, challenge blobs, ...) are opaque to the engine and travel in
/// `params` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    /// API key of the provider instance performing the attempt
    pub api_key: String,
    /// Canonical CAPTCHA type
    pub captcha_type: CaptchaType,
    /// Site key (or vendor-specific equivalent, e.g. GeeTest `gt`)
    pub site_key: String,
    /// URL of the page presenting the challenge
    pub page_url: String,
    /// Additional vendor-opaque parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SolveRequest {
    pub fn new(
        api_key: impl Into<String>,
        captcha_type: CaptchaType,
        site_key: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            captcha_type,
            site_key: site_key.into(),
            page_url: page_url.into(),
            params: HashMap::new(),
        }
    }

    /// Attach an opaque vendor parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A successfully solved challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedToken {
    /// The token to inject into the follow-up request
    pub token: String,
    /// Identifier of the provider credited with the solve
    pub provider_id: String,
    /// Wall time of the successful provider call in milliseconds
    pub solve_time_ms: u64,
}
