//! Chat log: the append-only conversation shown to the user.

/// Text shown while the log has no messages
pub const PLACEHOLDER_TEXT: &str = "Start typing or speaking to begin...";

/// Who a bubble belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBubble {
    pub text: String,
    pub role: Role,
}

/// Audio player with controls, pointing at a fully resolved URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPlayer {
    pub src: String,
    pub controls: bool,
}

impl AudioPlayer {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            controls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEntry {
    Bubble(ChatBubble),
    Audio(AudioPlayer),
}

/// Contents of the chat container.
///
/// The placeholder can only be shown while no entry has ever been added.
/// Every append scrolls the view to the newest entry.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
    placeholder: bool,
    scroll_position: usize,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the log contents with the placeholder.
    ///
    /// Returns `false` without touching anything once the conversation has
    /// started.
    pub fn show_placeholder(&mut self) -> bool {
        if !self.entries.is_empty() {
            return false;
        }
        self.placeholder = true;
        self.scroll_position = 0;
        true
    }

    /// Append a bubble, dropping the placeholder first.
    ///
    /// Returns whether a placeholder was removed.
    pub fn add_bubble(&mut self, text: impl Into<String>, role: Role) -> bool {
        let removed = std::mem::take(&mut self.placeholder);
        self.push(ChatEntry::Bubble(ChatBubble {
            text: text.into(),
            role,
        }));
        removed
    }

    pub fn add_audio(&mut self, player: AudioPlayer) {
        self.push(ChatEntry::Audio(player));
    }

    fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
        self.scroll_to_bottom();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_position = self.entries.len();
    }

    pub fn is_scrolled_to_bottom(&self) -> bool {
        self.scroll_position == self.entries.len()
    }

    pub fn has_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn bubbles(&self) -> impl Iterator<Item = &ChatBubble> {
        self.entries.iter().filter_map(|entry| match entry {
            ChatEntry::Bubble(bubble) => Some(bubble),
            ChatEntry::Audio(_) => None,
        })
    }

    pub fn audio_players(&self) -> impl Iterator<Item = &AudioPlayer> {
        self.entries.iter().filter_map(|entry| match entry {
            ChatEntry::Audio(player) => Some(player),
            ChatEntry::Bubble(_) => None,
        })
    }
}
