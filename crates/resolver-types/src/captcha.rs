//! Canonical CAPTCHA type codes.
//!
//! The traffic layer hands the engine a type code string produced by its
//! detector. Detectors and solving vendors disagree on spelling
//! (`recaptcha_v2`, `recaptcha-v2`, `recaptcha2`, ...), so every inbound code
//! is normalized to one canonical lowercase form before selection runs.

use serde::{Deserialize, Serialize};

/// A CAPTCHA challenge scheme the engine knows how to route.
///
/// The canonical code (see [`CaptchaType::code`]) is the lowercase,
/// separator-free form used everywhere inside the engine: in provider
/// capability sets, in selection, and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CaptchaType {
    RecaptchaV2,
    RecaptchaV3,
    HCaptcha,
    Turnstile,
    FunCaptcha,
    GeeTest,
    GeeTestV4,
    AwsWaf,
}

impl CaptchaType {
    /// The canonical type code.
    pub fn code(self) -> &'static str {
        match self {
            Self::RecaptchaV2 => "recaptchav2",
            Self::RecaptchaV3 => "recaptchav3",
            Self::HCaptcha => "hcaptcha",
            Self::Turnstile => "turnstile",
            Self::FunCaptcha => "funcaptcha",
            Self::GeeTest => "geetest",
            Self::GeeTestV4 => "geetestv4",
            Self::AwsWaf => "awswaf",
        }
    }

    /// Parse a type code, accepting recognized aliases.
    ///
    /// Codes are lowercased and stripped of `-`/`_` separators first, so
    /// `recaptcha_v2`, `Recaptcha-V2`, and `recaptchav2` all resolve to
    /// [`CaptchaType::RecaptchaV2`]. Returns `None` for unknown codes.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized: String = code
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "recaptchav2" | "recaptcha2" | "recaptcha" => Some(Self::RecaptchaV2),
            "recaptchav3" | "recaptcha3" => Some(Self::RecaptchaV3),
            "hcaptcha" => Some(Self::HCaptcha),
            "turnstile" | "cloudflareturnstile" => Some(Self::Turnstile),
            "funcaptcha" | "arkose" | "arkoselabs" => Some(Self::FunCaptcha),
            "geetest" => Some(Self::GeeTest),
            "geetestv4" | "geetest4" => Some(Self::GeeTestV4),
            "awswaf" | "amazonwaf" => Some(Self::AwsWaf),
            _ => None,
        }
    }
}

impl std::fmt::Display for CaptchaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl From<CaptchaType> for String {
    fn from(value: CaptchaType) -> Self {
        value.code().to_string()
    }
}

impl TryFrom<String> for CaptchaType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_code(&value).ok_or_else(|| format!("unknown CAPTCHA type code: {value}"))
    }
}
