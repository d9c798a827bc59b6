use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const API_KEY_VAR: &str = "AID_API_KEY";
pub const VISION_URL_VAR: &str = "AID_VISION_BASE_URL";
pub const SPEECH_URL_VAR: &str = "AID_SPEECH_BASE_URL";
pub const TIMEOUT_VAR: &str = "AID_TIMEOUT_SECS";

const DEFAULT_VISION_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_SPEECH_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Connection settings for the remote vision and speech services.
///
/// A missing API key is not an error: every remote call then fails fast and the
/// callers fall back to their canned results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_key: Option<String>,
    pub vision_base_url: String,
    pub speech_base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            vision_base_url: DEFAULT_VISION_URL.to_string(),
            speech_base_url: DEFAULT_SPEECH_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if api_key.is_none() {
            log::warn!("{} not set; remote analysis and speech will use fallbacks", API_KEY_VAR);
        }

        Self {
            api_key,
            vision_base_url: lookup(VISION_URL_VAR).unwrap_or(defaults.vision_base_url),
            speech_base_url: lookup(SPEECH_URL_VAR).unwrap_or(defaults.speech_base_url),
            timeout_secs: lookup(TIMEOUT_VAR)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
