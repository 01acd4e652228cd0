// Transcript models.
//
// A transcript is the ordered record of conversation turns that gets handed to
// the language model. The importer only ever appends to it, so the port it
// depends on is a single `append` method. Whoever owns the transcript decides
// how access is synchronized.

use crate::core::ai::AiMessage;
use crate::core::importer::importer_service::MAX_IMPORT_COUNT;
use chrono::{DateTime, Utc};

/// Who a transcript entry is attributed to when formatting model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn in a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub author_name: String,
    pub content: String,
}

impl TranscriptEntry {
    pub fn user(author_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            author_name: author_name.into(),
            content: content.into(),
        }
    }

    /// Converts to an AiMessage, prefixing user turns with the author's name.
    pub fn to_ai_message(&self) -> AiMessage {
        let content = if self.role == Role::User && !self.author_name.is_empty() {
            format!("{}: {}", self.author_name, self.content)
        } else {
            self.content.clone()
        };

        match self.role {
            Role::System => AiMessage::system(content),
            Role::User => AiMessage::user(content),
            Role::Assistant => AiMessage::assistant(content),
        }
    }
}

/// Append-only port for anything that records transcript entries.
///
/// Appends must be recorded in call order.
pub trait Transcript: Send {
    fn append(&mut self, entry: TranscriptEntry);
}

impl Transcript for Vec<TranscriptEntry> {
    fn append(&mut self, entry: TranscriptEntry) {
        self.push(entry);
    }
}

/// The bot's own transcript for a single channel.
///
/// When `max_entries` is set, the oldest entries are dropped once the cap is
/// exceeded so the model input stays bounded. A cap of 0 means unbounded, and
/// any other cap is raised to at least one full import so an import never
/// evicts its own entries.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    entries: Vec<TranscriptEntry>,
    max_entries: Option<usize>,
    updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: Self::effective_cap(max_entries),
            updated_at: None,
        }
    }

    /// The cap actually enforced for a requested `max_entries`.
    pub fn effective_cap(max_entries: Option<usize>) -> Option<usize> {
        max_entries
            .filter(|&max| max > 0)
            .map(|max| max.max(MAX_IMPORT_COUNT as usize))
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the last entry was appended, if ever.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.updated_at = None;
    }

    pub fn to_ai_messages(&self) -> Vec<AiMessage> {
        self.entries.iter().map(|e| e.to_ai_message()).collect()
    }
}

impl Transcript for Conversation {
    fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);

        if let Some(max) = self.max_entries {
            let overflow = self.entries.len().saturating_sub(max);
            if overflow > 0 {
                self.entries.drain(..overflow);
            }
        }

        self.updated_at = Some(Utc::now());
    }
}
