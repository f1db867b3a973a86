//! Speech capture: adapts an optional speech-recognition capability.
//!
//! Recognizers report asynchronously by sending [`SpeechEvent`]s over a
//! channel; the front end feeds those events back into the controller.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ChatError;

pub type SpeechEventSender = mpsc::UnboundedSender<SpeechEvent>;
pub type SpeechEventReceiver = mpsc::UnboundedReceiver<SpeechEvent>;

/// Recognition settings applied before every start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Keep listening after the first utterance
    pub continuous: bool,
    /// Report partial hypotheses while the user is still speaking
    pub interim_results: bool,
    /// BCP 47 tag (e.g., "en-US")
    pub language: String,
}

impl RecognitionConfig {
    /// One utterance, final results only
    pub fn single_shot(language: &str) -> Self {
        Self {
            continuous: false,
            interim_results: false,
            language: language.to_string(),
        }
    }
}

/// A recognition hypothesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub transcript: String,
}

impl Alternative {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    /// Final result, best hypothesis first
    Result(Vec<Alternative>),
    Error(String),
}

impl SpeechEvent {
    /// Best hypothesis of a result event
    pub fn top_transcript(&self) -> Option<&str> {
        match self {
            SpeechEvent::Result(alternatives) => {
                alternatives.first().map(|alt| alt.transcript.as_str())
            }
            SpeechEvent::Error(_) => None,
        }
    }
}

/// A platform speech-recognition capability.
pub trait SpeechRecognizer: Send {
    fn configure(&mut self, config: &RecognitionConfig);

    /// Begin one recognition session, reporting on `events`.
    fn start(&mut self, events: SpeechEventSender) -> anyhow::Result<()>;
}

/// Wraps the recognizer, if there is one, with the session's settings.
pub struct SpeechCapture {
    recognizer: Option<Mutex<Box<dyn SpeechRecognizer>>>,
    config: RecognitionConfig,
    events: SpeechEventSender,
}

impl SpeechCapture {
    pub fn new(
        recognizer: Option<Box<dyn SpeechRecognizer>>,
        language: &str,
    ) -> (Self, SpeechEventReceiver) {
        let config = RecognitionConfig::single_shot(language);
        let recognizer = recognizer.map(|mut recognizer| {
            recognizer.configure(&config);
            Mutex::new(recognizer)
        });
        let (events, receiver) = mpsc::unbounded_channel();

        (
            Self {
                recognizer,
                config,
                events,
            },
            receiver,
        )
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Reset the recognition language and start a session.
    pub fn start(&self) -> Result<(), ChatError> {
        let recognizer = self.recognizer.as_ref().ok_or(ChatError::SpeechUnsupported)?;
        let mut recognizer = recognizer.lock().unwrap_or_else(PoisonError::into_inner);

        recognizer.configure(&self.config);
        debug!("Starting speech recognition ({})", self.config.language);
        recognizer
            .start(self.events.clone())
            .map_err(|e| ChatError::Recognition(e.to_string()))
    }
}

/// Typed dictation: the next line of text stands in for an utterance.
///
/// `start` arms the recognizer; [`DictationHandle::deliver`] turns the next
/// line into a result event. Starting again while armed replaces the pending
/// session.
#[derive(Debug, Clone, Default)]
pub struct LineDictation {
    pending: Arc<Mutex<Option<SpeechEventSender>>>,
    language: String,
}

/// Feeds lines into an armed [`LineDictation`].
#[derive(Debug, Clone)]
pub struct DictationHandle {
    pending: Arc<Mutex<Option<SpeechEventSender>>>,
}

impl LineDictation {
    pub fn new() -> (Self, DictationHandle) {
        let dictation = Self::default();
        let handle = DictationHandle {
            pending: Arc::clone(&dictation.pending),
        };
        (dictation, handle)
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl SpeechRecognizer for LineDictation {
    fn configure(&mut self, config: &RecognitionConfig) {
        self.language = config.language.clone();
    }

    fn start(&mut self, events: SpeechEventSender) -> anyhow::Result<()> {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(events);
        Ok(())
    }
}

impl DictationHandle {
    pub fn is_listening(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Deliver a line as the session's result. Returns `false` when not
    /// listening.
    pub fn deliver(&self, line: &str) -> bool {
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(sender) = sender else {
            return false;
        };

        let transcript = line.trim();
        let event = if transcript.is_empty() {
            SpeechEvent::Error("no-speech".to_string())
        } else {
            SpeechEvent::Result(vec![Alternative::new(transcript)])
        };
        sender.send(event).is_ok()
    }
}
