use std::time::Duration;

use serde::{Deserialize, Serialize};

/// App identity and timing for the deep-link flow.
///
/// Every field has a production default, so a page may override any subset
/// through JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Custom URL scheme without `://`.
    pub scheme: String,
    pub android_package: String,
    pub ios_app_id: String,
    pub default_year: String,
    pub site_name: String,
    pub default_description: String,
    pub fallback_timeout_ms: u64,
    pub redirect_delay_ms: u64,
    pub intent_delay_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            scheme: "iburn".to_string(),
            android_package: "com.iburnapp.iburn3".to_string(),
            ios_app_id: "388169740".to_string(),
            default_year: "2025".to_string(),
            site_name: "iBurn".to_string(),
            default_description: "View on iBurn - Offline Map and Guide for Burning Man"
                .to_string(),
            fallback_timeout_ms: 2500,
            redirect_delay_ms: 100,
            intent_delay_ms: 200,
        }
    }
}

impl LinkConfig {
    pub fn scheme_prefix(&self) -> String {
        format!("{}://", self.scheme)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidJson(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidJson(msg) => write!(f, "invalid config json: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
