// This is the importer module - it pulls recent channel messages into a transcript.
// Like every core module it has no Discord-specific code: channels are resolved
// through the `MessageBackend` port and entries go through the `Transcript` port.

use super::importer_backend::{BackendError, MessageBackend};
use super::importer_models::ImportOutcome;
use crate::core::transcript::{Transcript, TranscriptEntry};
use thiserror::Error;

/// Number of messages imported when the caller doesn't ask for a count.
pub const DEFAULT_IMPORT_COUNT: u32 = 20;

/// Hard ceiling on messages imported per call, whatever the caller asks for.
pub const MAX_IMPORT_COUNT: u32 = 20;

/// How many messages are requested from the backend before truncation.
pub const HISTORY_WINDOW: usize = 100;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Channel '{0}' not found.")]
    ChannelNotFound(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Clamp a requested count to the import ceiling.
pub fn effective_count(requested: Option<u32>) -> usize {
    requested.unwrap_or(DEFAULT_IMPORT_COUNT).min(MAX_IMPORT_COUNT) as usize
}

pub struct MessageImporter<B: MessageBackend> {
    backend: B,
}

impl<B: MessageBackend> MessageImporter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Import the most recent messages of `channel_name` into `transcript`.
    ///
    /// Recency stands in for relevance: `query` is accepted but does not
    /// filter or rank anything. Entries are appended newest first, in the
    /// order the backend returned them, all tagged with the user role.
    ///
    /// **Returns:**
    /// - `Ok(ImportOutcome)` with the number of entries appended
    /// - `Err(ImportError::ChannelNotFound)` if no text channel has that name;
    ///   the transcript is untouched
    /// - `Err(ImportError::Backend)` if the lookup or history call failed
    pub async fn import_recent_messages<T: Transcript + ?Sized>(
        &self,
        guild_id: u64,
        query: &str,
        channel_name: &str,
        count: Option<u32>,
        transcript: &mut T,
    ) -> Result<ImportOutcome, ImportError> {
        let wanted = effective_count(count);

        let channel = self
            .backend
            .find_text_channel(guild_id, channel_name)
            .await?
            .ok_or_else(|| ImportError::ChannelNotFound(channel_name.to_string()))?;

        tracing::debug!(
            guild_id,
            channel = %channel.name,
            query,
            wanted,
            "Fetching channel history for import"
        );

        let messages = self.backend.fetch_history(&channel, HISTORY_WINDOW).await?;

        let mut inserted = 0;
        for message in messages.into_iter().take(wanted) {
            transcript.append(TranscriptEntry::user(message.author_name, message.content));
            inserted += 1;
        }

        tracing::info!(
            guild_id,
            channel = %channel_name,
            inserted,
            "Imported channel messages into transcript"
        );

        Ok(ImportOutcome {
            channel_name: channel_name.to_string(),
            inserted,
        })
    }

    /// Same as [`import_recent_messages`](Self::import_recent_messages), but
    /// renders the outcome as the human-readable status string.
    ///
    /// A missing channel becomes a status string; backend failures still
    /// propagate as errors.
    pub async fn import_and_report<T: Transcript + ?Sized>(
        &self,
        guild_id: u64,
        query: &str,
        channel_name: &str,
        count: Option<u32>,
        transcript: &mut T,
    ) -> Result<String, BackendError> {
        match self
            .import_recent_messages(guild_id, query, channel_name, count, transcript)
            .await
        {
            Ok(outcome) => Ok(outcome.status_message()),
            Err(err @ ImportError::ChannelNotFound(_)) => Ok(err.to_string()),
            Err(ImportError::Backend(err)) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript::{Conversation, Role};
    use crate::infra::importer::InMemoryMessageBackend;

    const GUILD: u64 = 42;

    fn backend_with_general(messages: usize) -> InMemoryMessageBackend {
        let backend = InMemoryMessageBackend::new();
        let general = backend.add_channel(GUILD, "general");
        for i in 0..messages {
            backend.push_message(general.id, format!("user{}", i), format!("message {}", i));
        }
        backend
    }

    #[test]
    fn counts_above_ceiling_are_clamped() {
        for requested in [21, 50, 100, u32::MAX] {
            assert_eq!(effective_count(Some(requested)), 20);
        }
        assert_eq!(effective_count(None), 20);
        assert_eq!(effective_count(Some(7)), 7);
    }

    #[tokio::test]
    async fn inserted_is_min_of_count_and_available() {
        for available in [0, 5, 30] {
            for count in 1..=20u32 {
                let importer = MessageImporter::new(backend_with_general(available));
                let mut transcript: Vec<TranscriptEntry> = Vec::new();

                let outcome = importer
                    .import_recent_messages(GUILD, "", "general", Some(count), &mut transcript)
                    .await
                    .unwrap();

                let expected = (count as usize).min(available);
                assert_eq!(outcome.inserted, expected);
                assert_eq!(transcript.len(), expected);
            }
        }
    }

    #[tokio::test]
    async fn default_count_imports_everything_in_small_channel() {
        let importer = MessageImporter::new(backend_with_general(5));
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let status = importer
            .import_and_report(GUILD, "anything", "general", None, &mut transcript)
            .await
            .unwrap();

        assert_eq!(
            status,
            "Inserted 5 messages from 'general' into the conversation context."
        );
        assert_eq!(transcript.len(), 5);
        assert!(transcript.iter().all(|e| e.role == Role::User));
    }

    #[tokio::test]
    async fn takes_most_recent_newest_first() {
        let importer = MessageImporter::new(backend_with_general(30));
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let status = importer
            .import_and_report(GUILD, "", "general", Some(10), &mut transcript)
            .await
            .unwrap();

        assert!(status.starts_with("Inserted 10 messages"));
        let contents: Vec<String> = transcript.iter().map(|e| e.content.clone()).collect();
        let expected: Vec<String> = (20..30).rev().map(|i| format!("message {}", i)).collect();
        assert_eq!(contents, expected);
        assert_eq!(transcript[0].author_name, "user29");
    }

    #[tokio::test]
    async fn missing_channel_leaves_transcript_untouched() {
        let backend = backend_with_general(5);
        let importer = MessageImporter::new(backend);
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let status = importer
            .import_and_report(GUILD, "", "missing-channel", Some(5), &mut transcript)
            .await
            .unwrap();

        assert_eq!(status, "Channel 'missing-channel' not found.");
        assert!(transcript.is_empty());
        assert_eq!(importer.backend.history_requests(), 0);
    }

    #[tokio::test]
    async fn channel_names_are_case_sensitive() {
        let importer = MessageImporter::new(backend_with_general(3));
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let err = importer
            .import_recent_messages(GUILD, "", "General", None, &mut transcript)
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::ChannelNotFound(ref name) if name == "General"));
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn channels_resolve_per_guild() {
        let importer = MessageImporter::new(backend_with_general(3));
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let status = importer
            .import_and_report(GUILD + 1, "", "general", None, &mut transcript)
            .await
            .unwrap();

        assert_eq!(status, "Channel 'general' not found.");
    }

    #[tokio::test]
    async fn zero_count_inserts_nothing() {
        let importer = MessageImporter::new(backend_with_general(3));
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let status = importer
            .import_and_report(GUILD, "", "general", Some(0), &mut transcript)
            .await
            .unwrap();

        assert_eq!(
            status,
            "Inserted 0 messages from 'general' into the conversation context."
        );
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn capped_conversation_keeps_every_imported_entry() {
        for cap in [Some(0), Some(1), Some(5)] {
            let importer = MessageImporter::new(backend_with_general(30));
            let mut conversation = Conversation::new(cap);

            let outcome = importer
                .import_recent_messages(GUILD, "", "general", None, &mut conversation)
                .await
                .unwrap();

            assert_eq!(outcome.inserted, 20);
            assert_eq!(conversation.len(), outcome.inserted);
            assert_eq!(conversation.entries()[0].content, "message 29");
        }
    }

    #[tokio::test]
    async fn backend_failures_propagate() {
        let backend = backend_with_general(3);
        backend.set_unavailable(true);
        let importer = MessageImporter::new(backend);
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let result = importer
            .import_and_report(GUILD, "", "general", None, &mut transcript)
            .await;

        assert!(matches!(result, Err(BackendError::Request(_))));
        assert!(transcript.is_empty());
    }
}
