//! The dialog-file protocol.
//!
//! A dialog file carries its whole session as text:
//!
//! ```text
//! model: gpt-4o
//! behavior: default
//!
//! Human: first question, may span lines
//!
//! AI: reply
//!
//! Human: next question
//! ```
//!
//! [`store`] creates the skeleton, [`parser`] turns the text into a validated
//! [`DialogDocument`], and [`append`] streams a reply back in.

pub mod append;
pub mod parser;
pub mod store;

pub use append::{append_response, AppendOutcome, AppendStatus};
pub use parser::{parse_dialog, parse_dialog_file};
pub use store::ensure_dialog_file;

/// Marker opening a human turn.
pub const HUMAN_MARKER: &str = "Human";
/// Marker opening a model turn.
pub const AI_MARKER: &str = "AI";

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Human,
    Ai,
}

impl Speaker {
    /// The literal marker token for this speaker.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Human => HUMAN_MARKER,
            Self::Ai => AI_MARKER,
        }
    }

    pub(crate) fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            HUMAN_MARKER => Some(Self::Human),
            AI_MARKER => Some(Self::Ai),
            _ => None,
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marker())
    }
}

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    /// Trimmed text between this marker and the next.
    pub content: String,
}

impl Turn {
    pub fn new(speaker: Speaker, content: impl Into<String>) -> Self {
        Self {
            speaker,
            content: content.into(),
        }
    }
}

/// A parsed and validated dialog file.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogDocument {
    pub model: String,
    pub behavior_description: String,
    pub temperature: f64,
    /// Never empty; the last turn is a non-empty Human turn.
    pub conversation: Vec<Turn>,
}

impl DialogDocument {
    /// The question the next reply answers.
    pub fn pending_question(&self) -> Option<&str> {
        self.conversation
            .last()
            .filter(|turn| turn.speaker == Speaker::Human)
            .map(|turn| turn.content.as_str())
    }
}
