// In-memory implementation of MessageBackend.
//
// Stands in for Discord when exercising the importer without a gateway
// connection. Messages are stored oldest first and served newest first, the
// same way Discord's history endpoint returns them. Only compiled for tests.

use crate::core::importer::{BackendError, ChannelHandle, MessageBackend, MessageRecord};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

pub struct InMemoryMessageBackend {
    /// guild_id -> text channels in that guild
    channels: DashMap<u64, Vec<ChannelHandle>>,
    /// channel_id -> messages, oldest first
    messages: DashMap<u64, Vec<MessageRecord>>,
    next_channel_id: AtomicU64,
    unavailable: AtomicBool,
    history_requests: AtomicUsize,
}

impl InMemoryMessageBackend {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            messages: DashMap::new(),
            next_channel_id: AtomicU64::new(1),
            unavailable: AtomicBool::new(false),
            history_requests: AtomicUsize::new(0),
        }
    }

    /// Create a text channel in a guild and return its handle.
    pub fn add_channel(&self, guild_id: u64, name: &str) -> ChannelHandle {
        let handle = ChannelHandle {
            id: self.next_channel_id.fetch_add(1, Ordering::Relaxed),
            guild_id,
            name: name.to_string(),
        };
        self.channels
            .entry(guild_id)
            .or_default()
            .push(handle.clone());
        self.messages.entry(handle.id).or_default();
        handle
    }

    /// Post a message to a channel. Each message is one minute newer than the last.
    pub fn push_message(
        &self,
        channel_id: u64,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) {
        let mut history = self.messages.entry(channel_id).or_default();
        let epoch = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default();
        let sent_at = epoch + Duration::minutes(history.len() as i64);

        history.push(MessageRecord {
            content: content.into(),
            author_name: author_name.into(),
            sent_at,
        });
    }

    /// Make every backend call fail, as if the platform were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// How many history requests have been made so far.
    pub fn history_requests(&self) -> usize {
        self.history_requests.load(Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::Relaxed) {
            Err(BackendError::Request("backend unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryMessageBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBackend for InMemoryMessageBackend {
    async fn find_text_channel(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<ChannelHandle>, BackendError> {
        self.check_available()?;

        Ok(self
            .channels
            .get(&guild_id)
            .and_then(|channels| channels.iter().find(|c| c.name == name).cloned()))
    }

    async fn fetch_history(
        &self,
        channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, BackendError> {
        self.history_requests.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        Ok(self
            .messages
            .get(&channel.id)
            .map(|history| history.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let backend = InMemoryMessageBackend::new();
        let channel = backend.add_channel(1, "general");
        for i in 0..5 {
            backend.push_message(channel.id, "bob", format!("{}", i));
        }

        let history = backend.fetch_history(&channel, 3).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["4", "3", "2"]);
        assert!(history[0].sent_at > history[1].sent_at);
        assert_eq!(backend.history_requests(), 1);
    }

    #[tokio::test]
    async fn lookup_is_exact_and_scoped_to_guild() {
        let backend = InMemoryMessageBackend::new();
        let general = backend.add_channel(1, "general");
        backend.add_channel(2, "random");

        assert_eq!(
            backend.find_text_channel(1, "general").await.unwrap(),
            Some(general)
        );
        assert_eq!(backend.find_text_channel(1, "gen").await.unwrap(), None);
        assert_eq!(backend.find_text_channel(1, "random").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unavailable_backend_fails_calls() {
        let backend = InMemoryMessageBackend::new();
        backend.add_channel(1, "general");
        backend.set_unavailable(true);

        assert!(backend.find_text_channel(1, "general").await.is_err());
    }
}
