//! Rendering seam between the controller and whatever displays the chat.
//!
//! The controller keeps the authoritative [`PageState`](crate::page::PageState)
//! and tells the view what changed. A view never calls back into the
//! controller.

use std::sync::{Mutex, PoisonError};

use crate::catalog::LanguageOption;
use crate::chat::ChatEntry;

pub trait ChatView: Send + Sync {
    /// Blocking notice the user has to acknowledge
    fn alert(&self, message: &str);

    /// A bubble or audio player was appended and the log scrolled to it
    fn append(&self, entry: &ChatEntry);

    fn show_placeholder(&self, _text: &str) {}

    fn remove_placeholder(&self) {}

    /// Transient status line; empty clears it
    fn set_status(&self, _status: &str) {}

    fn set_input(&self, _text: &str) {}

    /// Both selectors were repopulated
    fn languages_loaded(&self, _options: &[LanguageOption], _source: &str, _target: &str) {}

    /// The source selector changed programmatically; empty means cleared
    fn source_selected(&self, _code: &str) {}
}

/// Everything a [`RecordingView`] saw, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Alert(String),
    Append(ChatEntry),
    ShowPlaceholder(String),
    RemovePlaceholder,
    Status(String),
    Input(String),
    LanguagesLoaded { count: usize, source: String, target: String },
    SourceSelected(String),
}

/// Headless view that records every call.
///
/// Useful for driving the controller without a display, and for asserting on
/// what a user would have seen.
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: ViewEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Alert(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn appended(&self) -> Vec<ChatEntry> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Append(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }
}

impl ChatView for RecordingView {
    fn alert(&self, message: &str) {
        self.record(ViewEvent::Alert(message.to_string()));
    }

    fn append(&self, entry: &ChatEntry) {
        self.record(ViewEvent::Append(entry.clone()));
    }

    fn show_placeholder(&self, text: &str) {
        self.record(ViewEvent::ShowPlaceholder(text.to_string()));
    }

    fn remove_placeholder(&self) {
        self.record(ViewEvent::RemovePlaceholder);
    }

    fn set_status(&self, status: &str) {
        self.record(ViewEvent::Status(status.to_string()));
    }

    fn set_input(&self, text: &str) {
        self.record(ViewEvent::Input(text.to_string()));
    }

    fn languages_loaded(&self, options: &[LanguageOption], source: &str, target: &str) {
        self.record(ViewEvent::LanguagesLoaded {
            count: options.len(),
            source: source.to_string(),
            target: target.to_string(),
        });
    }

    fn source_selected(&self, code: &str) {
        self.record(ViewEvent::SourceSelected(code.to_string()));
    }
}
