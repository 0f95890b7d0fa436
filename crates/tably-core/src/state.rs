//! UI-agnostic conversation log types
//!
//! The message log is the single source of truth for what a front-end draws.
//! Entries are appended in chronological order and never touched again.

use serde::{Deserialize, Serialize};

use crate::render::ChartEntry;

/// One keyed data item returned by the analysis service, analogous to a row.
///
/// Usually a JSON object; scalars are tolerated and rendered verbatim.
pub type Record = serde_json::Value;

/// Who a text line is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Bot,
    /// Client-side status lines (format echo, forwarded query)
    System,
}

/// A single line of conversation text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntry {
    pub role: ChatRole,
    pub content: String,
}

impl TextEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Bot, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }
}

impl std::fmt::Display for TextEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.role {
            ChatRole::User => write!(f, "You: {}", self.content),
            ChatRole::Bot => write!(f, "Bot: {}", self.content),
            ChatRole::System => f.write_str(&self.content),
        }
    }
}

/// A displayable item in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageEntry {
    Text(TextEntry),
    Chart(ChartEntry),
}

impl MessageEntry {
    pub fn as_text(&self) -> Option<&TextEntry> {
        match self {
            MessageEntry::Text(text) => Some(text),
            MessageEntry::Chart(_) => None,
        }
    }

    pub fn as_chart(&self) -> Option<&ChartEntry> {
        match self {
            MessageEntry::Chart(chart) => Some(chart),
            MessageEntry::Text(_) => None,
        }
    }
}

impl From<TextEntry> for MessageEntry {
    fn from(entry: TextEntry) -> Self {
        MessageEntry::Text(entry)
    }
}

impl From<ChartEntry> for MessageEntry {
    fn from(entry: ChartEntry) -> Self {
        MessageEntry::Chart(entry)
    }
}

/// Append-only, chronologically ordered conversation log
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<MessageEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<MessageEntry>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MessageEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a MessageEntry;
    type IntoIter = std::slice::Iter<'a, MessageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
