//! Sleeper client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.sleeper.app/v1";
pub const DEFAULT_RESEARCH_BASE_URL: &str = "https://api.sleeper.app";

/// Sleeper API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperConfig {
    pub api_base_url: String,
    /// Research endpoints live outside the versioned API
    pub research_base_url: String,
    pub timeout_secs: u64,
}

impl Default for SleeperConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            research_base_url: DEFAULT_RESEARCH_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl SleeperConfig {
    /// Read overrides from `SLEEPER_API_BASE_URL`, `SLEEPER_RESEARCH_BASE_URL`
    /// and `HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("SLEEPER_API_BASE_URL").unwrap_or(defaults.api_base_url),
            research_base_url: std::env::var("SLEEPER_RESEARCH_BASE_URL")
                .unwrap_or(defaults.research_base_url),
            timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
