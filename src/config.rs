use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

// Default configuration values
const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend endpoint paths.
///
/// The backend exposes two endpoint families: the versioned auth/patient API
/// and the unversioned OCR/registration services. Both are carried here so
/// there is a single authoritative path table.
pub mod endpoints {
    // Auth
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const VERIFY_OTP: &str = "/api/v1/auth/verify-otp";
    pub const RESEND_OTP: &str = "/api/v1/auth/resend-otp";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const REFRESH: &str = "/api/v1/auth/refresh";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const ME: &str = "/api/v1/auth/me";
    pub const CHANGE_PASSWORD: &str = "/api/v1/auth/change-password";
    pub const FORGOT_PASSWORD: &str = "/api/v1/auth/forgot-password";
    pub const RESET_PASSWORD: &str = "/api/v1/auth/reset-password";

    // Patient / user profiles
    pub const PATIENT_ME: &str = "/api/v1/patients/me";
    pub const USER_ME: &str = "/api/v1/users/me";

    // Document OCR
    pub const OCR_EMIRATES_ID: &str = "/ocr/emirates-id";
    pub const OCR_PASSPORT: &str = "/ocr/passport";

    // Manual document registration
    pub const REGISTER_EMIRATES_ID: &str = "/registration/emirates-id/manual";
    pub const REGISTER_PASSPORT: &str = "/registration/passport/manual";
    pub const GET_EMIRATES_ID: &str = "/registration/emirates-id";
    pub const GET_PASSPORT: &str = "/registration/passport";
}

/// Client configuration: where the backend lives and how long to wait for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fixed per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from the environment (`NEURULA_BASE_URL`,
    /// `NEURULA_TIMEOUT_SECS`), falling back to defaults. Reads a `.env`
    /// file when one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("NEURULA_BASE_URL")
            .unwrap_or_else(|_| default_base_url())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = match std::env::var("NEURULA_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Invalid NEURULA_TIMEOUT_SECS, using default");
                default_timeout_secs()
            }),
            Err(_) => default_timeout_secs(),
        };

        Self {
            base_url,
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join an endpoint path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining_tolerates_trailing_slash() {
        let config = ApiConfig {
            base_url: "http://example.com/".to_string(),
            timeout_secs: 5,
        };
        assert_eq!(
            config.url(endpoints::LOGIN),
            "http://example.com/api/v1/auth/login"
        );
    }

    #[test]
    fn defaults_are_sensible() {
        let config = ApiConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.base_url.starts_with("http"));
    }
}
