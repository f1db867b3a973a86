//! The chat controller: turns user actions into backend calls and renders
//! the results.
//!
//! All user-visible state lives in one [`PageState`] behind an async mutex.
//! The lock is never held across a network call.
//!
//! Validation, transport, server and speech failures raise a blocking notice
//! through [`ChatView::alert`]. Language detection failures are only logged.
//!
//! Overlapping translate (or detect) calls resolve as "latest wins": each call
//! takes a generation number, and a response that comes back after a newer
//! call of the same kind was issued is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, SpeakRequest, TranslationRequest};
use crate::chat::{AudioPlayer, ChatEntry, Role, PLACEHOLDER_TEXT};
use crate::config::Config;
use crate::environment::resolve_audio_url;
use crate::error::ChatError;
use crate::page::PageState;
use crate::speech::{SpeechCapture, SpeechEvent, SpeechEventReceiver, SpeechRecognizer};
use crate::view::ChatView;

/// Status shown while a translation is in flight
pub const TRANSLATING_STATUS: &str = "Translating...";

pub struct ChatController<V: ChatView> {
    api: ApiClient,
    view: Arc<V>,
    state: Mutex<PageState>,
    speech: SpeechCapture,
    default_target_language: String,
    translate_generation: AtomicU64,
    detect_generation: AtomicU64,
}

impl<V: ChatView> ChatController<V> {
    /// Create a controller. The returned receiver carries the recognizer's
    /// events; feed each one to [`handle_speech_event`](Self::handle_speech_event).
    pub fn new(
        config: &Config,
        api: ApiClient,
        view: Arc<V>,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
    ) -> (Self, SpeechEventReceiver) {
        let (speech, events) = SpeechCapture::new(recognizer, &config.speech_language);

        let controller = Self {
            api,
            view,
            state: Mutex::new(PageState::default()),
            speech,
            default_target_language: config.default_target_language.clone(),
            translate_generation: AtomicU64::new(0),
            detect_generation: AtomicU64::new(0),
        };

        (controller, events)
    }

    pub fn api_base(&self) -> &str {
        self.api.base_url()
    }

    /// Copy of the current page state
    pub async fn snapshot(&self) -> PageState {
        self.state.lock().await.clone()
    }

    fn report(&self, error: &ChatError) {
        warn!("{}", error);
        self.view.alert(&error.to_string());
    }

    // ==================== Page Lifecycle ====================

    /// Initial page setup: placeholder, speech capability notice, catalog.
    pub async fn load(&self) {
        self.show_placeholder().await;

        if !self.speech.is_supported() {
            self.report(&ChatError::SpeechUnsupported);
        }

        // Failures are already reported to the user
        let _ = self.load_languages().await;
    }

    /// Fetch the catalog and repopulate both selectors.
    pub async fn load_languages(&self) -> Result<(), ChatError> {
        let catalog = match self.api.fetch_languages().await {
            Ok(catalog) => catalog,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        info!("Loaded {} languages", catalog.len());

        let mut state = self.state.lock().await;
        state.source.populate(&catalog);
        state.target.populate(&catalog);
        state.target.select(&self.default_target_language);

        self.view.languages_loaded(
            state.source.options(),
            state.source.value(),
            state.target.value(),
        );
        Ok(())
    }

    // ==================== User Input ====================

    pub async fn set_input_text(&self, text: &str) {
        self.state.lock().await.input_text = text.to_string();
    }

    /// Returns `false` when the code is not among the loaded languages
    pub async fn select_source(&self, code: &str) -> bool {
        self.state.lock().await.source.select(code)
    }

    /// Returns `false` when the code is not among the loaded languages
    pub async fn select_target(&self, code: &str) -> bool {
        self.state.lock().await.target.select(code)
    }

    // ==================== Chat Rendering ====================

    pub async fn show_placeholder(&self) {
        let mut state = self.state.lock().await;
        if state.chat.show_placeholder() {
            self.view.show_placeholder(PLACEHOLDER_TEXT);
        }
    }

    pub async fn add_bubble(&self, text: &str, role: Role) {
        let mut state = self.state.lock().await;
        self.push_bubble(&mut state, text, role);
    }

    fn push_bubble(&self, state: &mut PageState, text: &str, role: Role) {
        if state.chat.add_bubble(text, role) {
            self.view.remove_placeholder();
        }
        if let Some(entry) = state.chat.entries().last() {
            self.view.append(entry);
        }
    }

    async fn add_audio(&self, audio_url: &str) {
        let player = AudioPlayer::new(resolve_audio_url(self.api.base_url(), audio_url));
        debug!("Adding audio player for {}", player.src);

        let mut state = self.state.lock().await;
        state.chat.add_audio(player.clone());
        self.view.append(&ChatEntry::Audio(player));
    }

    // ==================== Translation ====================

    /// Translate the current input into the target language.
    pub async fn translate(&self) -> Result<(), ChatError> {
        let request = {
            let mut state = self.state.lock().await;

            if state.input_text.is_empty()
                || state.source.value().is_empty()
                || state.target.value().is_empty()
            {
                drop(state);
                self.report(&ChatError::Validation);
                return Err(ChatError::Validation);
            }

            let request = TranslationRequest {
                text: std::mem::take(&mut state.input_text),
                input_lang: state.source.value().to_string(),
                output_lang: state.target.value().to_string(),
            };

            self.push_bubble(&mut state, &request.text, Role::User);
            state.status = TRANSLATING_STATUS.to_string();
            self.view.set_status(TRANSLATING_STATUS);
            self.view.set_input("");

            request
        };

        let generation = self.translate_generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Translating {} chars ({} -> {})",
            request.text.chars().count(),
            request.input_lang,
            request.output_lang
        );

        let result = self.api.translate(&request).await;

        if self.translate_generation.load(Ordering::SeqCst) != generation {
            debug!("Dropping translation response superseded by a newer request");
            return Ok(());
        }

        self.clear_status().await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            let error = ChatError::Server(error);
            self.report(&error);
            return Err(error);
        }

        let Some(translated_text) = response.translated_text else {
            let error = ChatError::transport(
                "Translation failed",
                "response did not include translated_text",
            );
            self.report(&error);
            return Err(error);
        };

        if let Some(subtitles) = &response.subtitles {
            debug!("Subtitles: {}", subtitles);
        }

        self.add_bubble(&translated_text, Role::Bot).await;

        if let Some(audio_url) = response.audio_url.as_deref().filter(|url| !url.is_empty()) {
            self.add_audio(audio_url).await;
        }

        Ok(())
    }

    async fn clear_status(&self) {
        let mut state = self.state.lock().await;
        state.status.clear();
        self.view.set_status("");
    }

    // ==================== Language Detection ====================

    /// Detect the language of `text` and preselect it as the source.
    ///
    /// Returns the code that was selected, if any. Never alerts.
    pub async fn detect_language(&self, text: &str) -> Option<String> {
        let generation = self.detect_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let response = match self.api.detect_language(text).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Language detection error: {}", e);
                return None;
            }
        };

        if self.detect_generation.load(Ordering::SeqCst) != generation {
            debug!("Dropping detection response superseded by a newer request");
            return None;
        }

        let Some(code) = response.detected_language else {
            warn!(
                "Language detection failed: {}",
                response.error.as_deref().unwrap_or("no language in response")
            );
            return None;
        };

        info!(
            "Detected language: {} (confidence: {})",
            code,
            response
                .confidence
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        let mut state = self.state.lock().await;
        if state.source.select(&code) {
            self.view.source_selected(&code);
            Some(code)
        } else {
            debug!("Detected language '{}' is not in the catalog", code);
            None
        }
    }

    // ==================== Speech ====================

    /// Clear the input and source language, then start a recognition session.
    pub async fn start_listening(&self) -> Result<(), ChatError> {
        if !self.speech.is_supported() {
            self.report(&ChatError::SpeechUnsupported);
            return Err(ChatError::SpeechUnsupported);
        }

        {
            let mut state = self.state.lock().await;
            state.input_text.clear();
            state.source.clear_selection();
            self.view.set_input("");
            self.view.source_selected("");
        }

        self.speech.start().inspect_err(|e| self.report(e))
    }

    /// Apply one event from the recognizer.
    pub async fn handle_speech_event(&self, event: SpeechEvent) {
        match &event {
            SpeechEvent::Result(_) => {
                let Some(transcript) = event.top_transcript() else {
                    debug!("Speech result without alternatives");
                    return;
                };

                {
                    let mut state = self.state.lock().await;
                    state.input_text = transcript.to_string();
                    self.view.set_input(transcript);
                }

                self.detect_language(transcript).await;
            }
            SpeechEvent::Error(message) => {
                self.report(&ChatError::Recognition(message.clone()));
            }
        }
    }

    // ==================== Input Playback ====================

    /// Synthesize the current input in the source language.
    pub async fn speak_input(&self) -> Result<(), ChatError> {
        let request = {
            let state = self.state.lock().await;
            SpeakRequest {
                text: state.input_text.clone(),
                lang: state.source.value().to_string(),
            }
        };

        if request.text.is_empty() || request.lang.is_empty() {
            self.report(&ChatError::Validation);
            return Err(ChatError::Validation);
        }

        let response = match self.api.speak_input(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            let error = ChatError::Server(error);
            self.report(&error);
            return Err(error);
        }

        match response.audio_url.as_deref().filter(|url| !url.is_empty()) {
            Some(audio_url) => self.add_audio(audio_url).await,
            None => debug!("Speech synthesis returned no audio"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::{Alternative, RecognitionConfig, SpeechEventSender};
    use crate::view::{RecordingView, ViewEvent};
    use std::time::Duration;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn create_controller(
        base_url: &str,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
    ) -> (ChatController<RecordingView>, Arc<RecordingView>) {
        let view = Arc::new(RecordingView::new());
        let (controller, _events) = ChatController::new(
            &Config::default(),
            ApiClient::new(base_url),
            Arc::clone(&view),
            recognizer,
        );
        (controller, view)
    }

    async fn mount_languages(mock_server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(mock_server)
            .await;
    }

    async fn loaded_controller(
        mock_server: &MockServer,
    ) -> (ChatController<RecordingView>, Arc<RecordingView>) {
        mount_languages(mock_server, r#"{"en": "english", "fr": "french", "es": "spanish"}"#)
            .await;
        let (controller, view) = create_controller(&mock_server.uri(), None);
        controller.load_languages().await.expect("Should load");
        (controller, view)
    }

    /// Recognizer that does nothing on start; tests inject events directly
    struct SilentRecognizer;

    impl SpeechRecognizer for SilentRecognizer {
        fn configure(&mut self, _config: &RecognitionConfig) {}

        fn start(&mut self, _events: SpeechEventSender) -> anyhow::Result<()> {
            Ok(())
        }
    }

    // ==================== Load Tests ====================

    #[tokio::test]
    async fn test_load_shows_placeholder_and_unsupported_notice_once() {
        let mock_server = MockServer::start().await;
        mount_languages(&mock_server, r#"{"en": "english"}"#).await;
        let (controller, view) = create_controller(&mock_server.uri(), None);

        controller.load().await;

        assert_eq!(
            view.alerts(),
            vec!["Voice recognition is not supported on this device."]
        );
        assert!(view
            .events()
            .contains(&ViewEvent::ShowPlaceholder(PLACEHOLDER_TEXT.to_string())));
        assert!(controller.snapshot().await.chat.has_placeholder());
    }

    #[tokio::test]
    async fn test_load_with_recognizer_has_no_notice() {
        let mock_server = MockServer::start().await;
        mount_languages(&mock_server, r#"{"en": "english"}"#).await;
        let (controller, view) =
            create_controller(&mock_server.uri(), Some(Box::new(SilentRecognizer)));

        controller.load().await;

        assert!(view.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_load_languages_defaults_target_to_english() {
        let mock_server = MockServer::start().await;
        let (controller, view) = loaded_controller(&mock_server).await;

        let state = controller.snapshot().await;
        assert_eq!(state.target.value(), "en");
        assert_eq!(state.source.options().len(), 3);
        assert_eq!(state.target.options().len(), 3);
        assert!(view.events().contains(&ViewEvent::LanguagesLoaded {
            count: 3,
            source: "en".to_string(),
            target: "en".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_load_languages_without_english_keeps_first_option() {
        let mock_server = MockServer::start().await;
        mount_languages(&mock_server, r#"{"fr": "french", "de": "german"}"#).await;
        let (controller, _view) = create_controller(&mock_server.uri(), None);

        controller.load_languages().await.expect("Should load");

        assert_eq!(controller.snapshot().await.target.value(), "fr");
    }

    #[tokio::test]
    async fn test_load_languages_failure_alerts_and_keeps_selectors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/languages"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;
        let (controller, view) = create_controller(&mock_server.uri(), None);

        let result = controller.load_languages().await;

        assert!(result.is_err());
        let alerts = view.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Failed to load languages"));
        assert!(controller.snapshot().await.source.options().is_empty());
    }

    // ==================== Rendering Tests ====================

    #[tokio::test]
    async fn test_add_bubble_removes_placeholder_once() {
        let (controller, view) = create_controller("http://127.0.0.1:9", None);

        controller.show_placeholder().await;
        controller.add_bubble("first", Role::User).await;
        controller.add_bubble("second", Role::Bot).await;
        controller.show_placeholder().await;

        let removals = view
            .events()
            .iter()
            .filter(|e| **e == ViewEvent::RemovePlaceholder)
            .count();
        let placeholders = view
            .events()
            .iter()
            .filter(|e| matches!(e, ViewEvent::ShowPlaceholder(_)))
            .count();
        assert_eq!(removals, 1);
        assert_eq!(placeholders, 1);

        let state = controller.snapshot().await;
        assert!(!state.chat.has_placeholder());
        assert!(state.chat.is_scrolled_to_bottom());
        assert_eq!(state.chat.entries().len(), 2);
    }

    // ==================== Translation Tests ====================

    #[tokio::test]
    async fn test_translate_validation_issues_no_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;
        let (controller, view) = loaded_controller(&mock_server).await;

        // Empty text
        assert_eq!(controller.translate().await, Err(ChatError::Validation));

        // Empty source
        controller.set_input_text("bonjour").await;
        controller
            .state
            .lock()
            .await
            .source
            .clear_selection();
        assert_eq!(controller.translate().await, Err(ChatError::Validation));

        assert_eq!(
            view.alerts(),
            vec!["Please fill all fields.", "Please fill all fields."]
        );
        assert!(controller.snapshot().await.chat.entries().is_empty());
    }

    #[tokio::test]
    async fn test_translate_without_catalog_fails_validation() {
        let (controller, view) = create_controller("http://127.0.0.1:9", None);
        controller.set_input_text("hello").await;

        assert_eq!(controller.translate().await, Err(ChatError::Validation));
        assert_eq!(view.alerts(), vec!["Please fill all fields."]);
    }

    #[tokio::test]
    async fn test_translate_renders_bubbles_and_relative_audio() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translated_text": "Hola",
                "audio_url": "/static/a.mp3"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        let (controller, view) = loaded_controller(&mock_server).await;

        controller.set_input_text("Hello").await;
        controller.select_target("es").await;
        controller.translate().await.expect("Should succeed");

        let state = controller.snapshot().await;
        let bubbles: Vec<_> = state.chat.bubbles().map(|b| (b.text.as_str(), b.role)).collect();
        assert_eq!(bubbles, vec![("Hello", Role::User), ("Hola", Role::Bot)]);

        let players: Vec<_> = state.chat.audio_players().collect();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].src, format!("{}/static/a.mp3", mock_server.uri()));
        assert!(state.chat.is_scrolled_to_bottom());

        assert_eq!(state.input_text, "");
        assert_eq!(state.status, "");
        assert!(view.alerts().is_empty());
        assert!(view
            .events()
            .contains(&ViewEvent::Status(TRANSLATING_STATUS.to_string())));
    }

    #[tokio::test]
    async fn test_translate_absolute_audio_is_unchanged() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translated_text": "Hola",
                "audio_url": "https://cdn.example/a.mp3"
            })))
            .mount(&mock_server)
            .await;
        let (controller, _view) = loaded_controller(&mock_server).await;

        controller.set_input_text("Hello").await;
        controller.translate().await.expect("Should succeed");

        let state = controller.snapshot().await;
        let players: Vec<_> = state.chat.audio_players().collect();
        assert_eq!(players[0].src, "https://cdn.example/a.mp3");
    }

    #[tokio::test]
    async fn test_translate_server_error_alerts_without_bot_bubble() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "bad language"})),
            )
            .mount(&mock_server)
            .await;
        let (controller, view) = loaded_controller(&mock_server).await;

        controller.set_input_text("Hello").await;
        let result = controller.translate().await;

        assert_eq!(result, Err(ChatError::Server("bad language".to_string())));
        assert_eq!(view.alerts(), vec!["bad language"]);

        let state = controller.snapshot().await;
        assert_eq!(state.chat.bubbles().count(), 1);
        assert_eq!(state.chat.bubbles().filter(|b| b.role == Role::Bot).count(), 0);
        assert_eq!(state.status, "");
    }

    #[tokio::test]
    async fn test_translate_empty_error_field_is_not_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translated_text": "Hola",
                "error": ""
            })))
            .mount(&mock_server)
            .await;
        let (controller, view) = loaded_controller(&mock_server).await;

        controller.set_input_text("Hello").await;
        controller.translate().await.expect("Should succeed");

        assert!(view.alerts().is_empty());
        let state = controller.snapshot().await;
        let bot: Vec<_> = state
            .chat
            .bubbles()
            .filter(|b| b.role == Role::Bot)
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(bot, vec!["Hola"]);
    }

    #[tokio::test]
    async fn test_translate_transport_error_clears_status() {
        let mock_server = MockServer::start().await;
        let (controller, view) = loaded_controller(&mock_server).await;
        // No /translate mock: wiremock answers 404 with an empty body

        controller.set_input_text("Hello").await;
        let result = controller.translate().await;

        assert!(matches!(result, Err(ChatError::Transport { .. })));
        let alerts = view.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Translation failed"));
        assert_eq!(controller.snapshot().await.status, "");
    }

    #[tokio::test]
    async fn test_translate_latest_request_wins() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_partial_json(serde_json::json!({"text": "one"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"translated_text": "uno"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_partial_json(serde_json::json!({"text": "two"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"translated_text": "dos"})),
            )
            .mount(&mock_server)
            .await;
        let (controller, _view) = loaded_controller(&mock_server).await;
        let controller = Arc::new(controller);

        controller.set_input_text("one").await;
        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.translate().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        controller.set_input_text("two").await;
        controller.translate().await.expect("Should succeed");
        first.await.expect("Task should finish").expect("Stale response is not an error");

        let state = controller.snapshot().await;
        let bot: Vec<_> = state
            .chat
            .bubbles()
            .filter(|b| b.role == Role::Bot)
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(bot, vec!["dos"]);
        assert_eq!(state.chat.bubbles().filter(|b| b.role == Role::User).count(), 2);
    }

    // ==================== Detection Tests ====================

    #[tokio::test]
    async fn test_detect_language_selects_known_code() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect_language"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "detected_language": "fr",
                "confidence": 0.9
            })))
            .mount(&mock_server)
            .await;
        let (controller, view) = loaded_controller(&mock_server).await;

        let selected = controller.detect_language("bonjour").await;

        assert_eq!(selected.as_deref(), Some("fr"));
        assert_eq!(controller.snapshot().await.source.value(), "fr");
        assert!(view.events().contains(&ViewEvent::SourceSelected("fr".to_string())));
    }

    #[tokio::test]
    async fn test_detect_language_ignores_confidence_shape() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect_language"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "detected_language": "fr",
                "confidence": [0.9]
            })))
            .mount(&mock_server)
            .await;
        let (controller, _view) = loaded_controller(&mock_server).await;

        let selected = controller.detect_language("bonjour").await;

        assert_eq!(selected.as_deref(), Some("fr"));
        assert_eq!(controller.snapshot().await.source.value(), "fr");
    }

    #[tokio::test]
    async fn test_detect_language_unknown_code_leaves_selection() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect_language"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"detected_language": "ja"})),
            )
            .mount(&mock_server)
            .await;
        let (controller, _view) = loaded_controller(&mock_server).await;
        controller.select_source("es").await;

        let selected = controller.detect_language("konnichiwa").await;

        assert!(selected.is_none());
        assert_eq!(controller.snapshot().await.source.value(), "es");
    }

    #[tokio::test]
    async fn test_detect_language_failures_never_alert() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect_language"))
            .respond_with(ResponseTemplate::new(500).set_body_json(
                serde_json::json!({"error": "Language detection failed: boom"}),
            ))
            .mount(&mock_server)
            .await;
        let (controller, view) = loaded_controller(&mock_server).await;

        assert!(controller.detect_language("hello").await.is_none());

        let (offline, offline_view) = create_controller("http://127.0.0.1:9", None);
        assert!(offline.detect_language("hello").await.is_none());

        assert!(view.alerts().is_empty());
        assert!(offline_view.alerts().is_empty());
    }

    // ==================== Speech Tests ====================

    #[tokio::test]
    async fn test_start_listening_clears_input_and_source() {
        let mock_server = MockServer::start().await;
        mount_languages(&mock_server, r#"{"en": "english", "fr": "french"}"#).await;
        let (controller, view) =
            create_controller(&mock_server.uri(), Some(Box::new(SilentRecognizer)));
        controller.load_languages().await.expect("Should load");
        controller.set_input_text("old text").await;

        controller.start_listening().await.expect("Should start");

        let state = controller.snapshot().await;
        assert_eq!(state.input_text, "");
        assert_eq!(state.source.value(), "");
        assert!(view.events().contains(&ViewEvent::SourceSelected(String::new())));
    }

    #[tokio::test]
    async fn test_start_listening_without_capability_alerts() {
        let (controller, view) = create_controller("http://127.0.0.1:9", None);

        assert_eq!(
            controller.start_listening().await,
            Err(ChatError::SpeechUnsupported)
        );
        assert_eq!(view.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_speech_result_fills_input_and_detects() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect_language"))
            .and(body_partial_json(serde_json::json!({"text": "hola amigo"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"detected_language": "es"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        let (controller, _view) = loaded_controller(&mock_server).await;

        controller
            .handle_speech_event(SpeechEvent::Result(vec![
                Alternative::new("hola amigo"),
                Alternative::new("ola amigo"),
            ]))
            .await;

        let state = controller.snapshot().await;
        assert_eq!(state.input_text, "hola amigo");
        assert_eq!(state.source.value(), "es");
    }

    #[tokio::test]
    async fn test_speech_error_alerts() {
        let (controller, view) = create_controller("http://127.0.0.1:9", None);

        controller
            .handle_speech_event(SpeechEvent::Error("not-allowed".to_string()))
            .await;

        assert_eq!(view.alerts(), vec!["Voice recognition error: not-allowed"]);
    }

    // ==================== Speak Input Tests ====================

    #[tokio::test]
    async fn test_speak_input_appends_audio() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speak_input"))
            .and(body_partial_json(serde_json::json!({"text": "bonjour", "lang": "fr"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "audio_url": "/static/input_audio_1.mp3"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        let (controller, _view) = loaded_controller(&mock_server).await;
        controller.set_input_text("bonjour").await;
        controller.select_source("fr").await;

        controller.speak_input().await.expect("Should succeed");

        let state = controller.snapshot().await;
        let players: Vec<_> = state.chat.audio_players().collect();
        assert_eq!(
            players[0].src,
            format!("{}/static/input_audio_1.mp3", mock_server.uri())
        );
        assert_eq!(state.input_text, "bonjour");
    }

    #[tokio::test]
    async fn test_speak_input_empty_error_field_is_not_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speak_input"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "audio_url": "/static/input_audio_2.mp3",
                "error": ""
            })))
            .mount(&mock_server)
            .await;
        let (controller, view) = loaded_controller(&mock_server).await;
        controller.set_input_text("hello").await;

        controller.speak_input().await.expect("Should succeed");

        assert!(view.alerts().is_empty());
        assert_eq!(controller.snapshot().await.chat.audio_players().count(), 1);
    }

    #[tokio::test]
    async fn test_speak_input_requires_text() {
        let (controller, view) = create_controller("http://127.0.0.1:9", None);

        assert_eq!(controller.speak_input().await, Err(ChatError::Validation));
        assert_eq!(view.alerts(), vec!["Please fill all fields."]);
    }
}
