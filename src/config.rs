//! Application-level configuration constants and the runtime `AppConfig`.

use crate::countdown::CountdownTarget;
use crate::error::InvalidTargetError;
use std::time::Duration;

// Countdown
pub const COMPETITION_START_ISO: &str = "2026-02-17T19:00:00Z";
pub const TICK_MS: u32 = 1000;

// Backend
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 30;

// Multipart field names
pub const FILE_FIELD: &str = "file";
pub const TEAM_FIELD: &str = "team";
pub const EMAIL_FIELD: &str = "email";

// Static links
pub const DATASET_URL: &str =
    "https://drive.google.com/drive/folders/1H8Kc-ExampleReplaceWithYourFolder";

/// Everything the page needs from the outside world, resolved once at startup
/// and handed to the components that use it.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend_base_url: String,
    pub dataset_url: String,
    pub competition_start: CountdownTarget,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Builds the configuration from the compile-time environment.
    ///
    /// `ARENA_BACKEND_URL` is read when the wasm bundle is built, the same way
    /// a bundler inlines its env vars. An empty value counts as unset.
    pub fn from_build_env() -> Result<Self, InvalidTargetError> {
        let backend = option_env!("ARENA_BACKEND_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BACKEND_URL);

        Ok(Self {
            backend_base_url: backend.to_string(),
            dataset_url: DATASET_URL.to_string(),
            competition_start: CountdownTarget::parse(COMPETITION_START_ISO)?,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SEC),
        })
    }

    pub fn with_backend_base_url(mut self, url: impl Into<String>) -> Self {
        self.backend_base_url = url.into();
        self
    }

    /// Full URL of the upload endpoint, tolerant of a trailing slash on the base.
    pub fn upload_endpoint(&self) -> String {
        format!("{}{}", self.backend_base_url.trim_end_matches('/'), UPLOAD_PATH)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BACKEND_URL.to_string(),
            dataset_url: DATASET_URL.to_string(),
            competition_start: CountdownTarget::from_millis(COMPETITION_START_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SEC),
        }
    }
}

/// `COMPETITION_START_ISO` as epoch milliseconds.
const COMPETITION_START_MS: i64 = 1_771_354_800_000;
