//! HTTP client for the translation backend.
//!
//! Every call returns the decoded response body. Application errors the
//! backend reports in an `error` field are left in the body for the caller to
//! interpret; only failures to obtain a decodable body become [`ChatError`]s.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::LanguageCatalog;
use crate::config::Config;
use crate::error::ChatError;

const LANGUAGES_FAILED: &str = "Failed to load languages";
const TRANSLATION_FAILED: &str = "Translation failed";
const DETECTION_FAILED: &str = "Language detection failed";
const SPEECH_FAILED: &str = "Speech synthesis failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRequest {
    pub text: String,
    pub input_lang: String,
    pub output_lang: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TranslationResult {
    #[serde(default)]
    pub translated_text: Option<String>,
    /// English rendering of the input, returned alongside every translation
    #[serde(default)]
    pub subtitles: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct DetectionRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub detected_language: Option<String>,
    /// Shape varies by backend (number, list, string); only ever logged
    #[serde(default)]
    pub confidence: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakRequest {
    pub text: String,
    pub lang: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpeechAudioResult {
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Client bound to one resolved base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client for the backend the configured host resolves to
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self::with_client(client, config.api_base()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /languages
    pub async fn fetch_languages(&self) -> Result<LanguageCatalog, ChatError> {
        let response = self
            .client
            .get(self.url("/languages"))
            .send()
            .await
            .map_err(|e| ChatError::transport(LANGUAGES_FAILED, e))?;

        decode(response, LANGUAGES_FAILED).await
    }

    /// POST /translate
    pub async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, ChatError> {
        self.post_json("/translate", request, TRANSLATION_FAILED).await
    }

    /// POST /detect_language
    pub async fn detect_language(&self, text: &str) -> Result<DetectionResult, ChatError> {
        self.post_json("/detect_language", &DetectionRequest { text }, DETECTION_FAILED)
            .await
    }

    /// POST /speak_input
    pub async fn speak_input(
        &self,
        request: &SpeakRequest,
    ) -> Result<SpeechAudioResult, ChatError> {
        self.post_json("/speak_input", request, SPEECH_FAILED).await
    }

    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        context: &'static str,
    ) -> Result<T, ChatError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ChatError::transport(context, e))?;

        decode(response, context).await
    }
}

/// Decode a JSON body whatever the status.
///
/// The backend answers application errors with a 4xx/5xx status and an
/// `{"error": ...}` body, so the body wins over the status. A status only
/// matters when the body is not the expected JSON.
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &'static str,
) -> Result<T, ChatError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| ChatError::transport(context, e))?;

    debug!("{} -> {} ({} bytes)", context, status, body.len());

    serde_json::from_slice(&body).map_err(|e| {
        if status.is_success() {
            ChatError::transport(context, format!("invalid response: {}", e))
        } else {
            ChatError::transport(context, status_message(status, &body))
        }
    })
}

fn status_message(status: StatusCode, body: &[u8]) -> String {
    let body = String::from_utf8_lossy(body);
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body)
    }
}
