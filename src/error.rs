use thiserror::Error;

/// Failures of a single user action.
///
/// Every variant is terminal for the action that produced it; nothing is
/// retried. The `Display` text is what the user sees in a blocking notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// A required field was empty, no request was issued
    #[error("Please fill all fields.")]
    Validation,

    /// The request never produced a usable response
    #[error("{context}: {message}")]
    Transport { context: &'static str, message: String },

    /// The backend answered with an `error` field
    #[error("{0}")]
    Server(String),

    /// No speech-recognition capability on this device
    #[error("Voice recognition is not supported on this device.")]
    SpeechUnsupported,

    /// The recognizer reported an error event
    #[error("Voice recognition error: {0}")]
    Recognition(String),
}

impl ChatError {
    pub(crate) fn transport(context: &'static str, error: impl std::fmt::Display) -> Self {
        ChatError::Transport {
            context,
            message: error.to_string(),
        }
    }
}
