//! Terminal front end: a line-oriented view and its command syntax.

use std::io::Write;

use crate::catalog::LanguageOption;
use crate::chat::{ChatEntry, Role};
use crate::view::ChatView;

/// Renders the chat to stdout, notices to stderr.
#[derive(Debug, Default)]
pub struct TerminalView;

impl TerminalView {
    fn print(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

impl ChatView for TerminalView {
    fn alert(&self, message: &str) {
        eprintln!("⚠️  {}", message);
    }

    fn append(&self, entry: &ChatEntry) {
        self.print(&format_entry(entry));
    }

    fn show_placeholder(&self, text: &str) {
        self.print(&format!("  {}", text));
    }

    fn set_status(&self, status: &str) {
        if !status.is_empty() {
            self.print(&format!("  … {}", status));
        }
    }

    fn languages_loaded(&self, options: &[LanguageOption], source: &str, target: &str) {
        self.print(&format!(
            "  {} languages available ({} → {}), /help for commands",
            options.len(),
            source,
            target
        ));
    }

    fn source_selected(&self, code: &str) {
        if !code.is_empty() {
            self.print(&format!("  source language: {}", code));
        }
    }
}

/// One line of chat output
pub fn format_entry(entry: &ChatEntry) -> String {
    match entry {
        ChatEntry::Bubble(bubble) => match bubble.role {
            Role::User => format!("you › {}", bubble.text),
            Role::Bot => format!("bot › {}", bubble.text),
        },
        ChatEntry::Audio(player) => format!("🔊 {}", player.src),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to translate
    Translate(String),
    Source(String),
    Target(String),
    Languages,
    Detect(String),
    Listen,
    Speak,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  <text>           translate text
  /from <code>     set the source language
  /to <code>       set the target language
  /languages       list available languages
  /detect <text>   detect and select the source language
  /listen          dictate: the next line is treated as speech
  /speak           play back the current input
  /help            show this help
  /quit            exit";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Command::Translate(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match (name, arg) {
            ("from", code) if !code.is_empty() => Command::Source(code.to_string()),
            ("to", code) if !code.is_empty() => Command::Target(code.to_string()),
            ("languages", _) => Command::Languages,
            ("detect", text) if !text.is_empty() => Command::Detect(text.to_string()),
            ("listen", _) => Command::Listen,
            ("speak", _) => Command::Speak,
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}
