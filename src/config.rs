use anyhow::{Context, Result};
use std::time::Duration;

use crate::environment::{Endpoints, DEFAULT_DEV_API_URL, DEFAULT_PROD_API_URL};

#[derive(Debug, Clone)]
pub struct Config {
    // Environment resolution
    pub host: String,
    pub endpoints: Endpoints,

    // Language defaults
    pub default_target_language: String,
    pub speech_language: String,

    // HTTP
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("REQUEST_TIMEOUT_SECS is not a number: '{}'", raw))?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            host: std::env::var("CHAT_HOST").unwrap_or_else(|_| "localhost".to_string()),
            endpoints: Endpoints::new(
                &std::env::var("DEV_API_URL").unwrap_or_else(|_| DEFAULT_DEV_API_URL.to_string()),
                &std::env::var("PROD_API_URL")
                    .unwrap_or_else(|_| DEFAULT_PROD_API_URL.to_string()),
            ),

            default_target_language: std::env::var("DEFAULT_TARGET_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),
            speech_language: std::env::var("SPEECH_LANGUAGE")
                .unwrap_or_else(|_| "en-US".to_string()),

            request_timeout,
        })
    }

    /// Base URL every request of this session goes to
    pub fn api_base(&self) -> &str {
        self.endpoints.resolve(&self.host)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            endpoints: Endpoints::default(),
            default_target_language: "en".to_string(),
            speech_language: "en-US".to_string(),
            request_timeout: None,
        }
    }
}
