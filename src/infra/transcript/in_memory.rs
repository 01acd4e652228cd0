// In-memory home for per-channel transcripts.
//
// Nothing is persisted: transcripts live for as long as the process does.
// Each conversation sits behind its own async mutex so an import holds the
// transcript for the whole fetch-and-append, and concurrent imports into the
// same channel are serialized instead of interleaving.

use crate::core::transcript::Conversation;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct TranscriptRegistry {
    /// channel_id -> that channel's conversation
    conversations: DashMap<u64, Arc<Mutex<Conversation>>>,
    max_entries: Option<usize>,
}

impl TranscriptRegistry {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            conversations: DashMap::new(),
            max_entries,
        }
    }

    /// Get (or create) the conversation for a channel.
    ///
    /// The returned Arc is detached from the map, so callers can hold its lock
    /// across awaits without blocking other channels.
    pub fn conversation(&self, channel_id: u64) -> Arc<Mutex<Conversation>> {
        self.conversations
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new(self.max_entries))))
            .clone()
    }

    /// Number of channels with a conversation.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript::{Transcript, TranscriptEntry};

    #[tokio::test]
    async fn same_channel_shares_one_conversation() {
        let registry = TranscriptRegistry::new(None);

        registry
            .conversation(1)
            .lock()
            .await
            .append(TranscriptEntry::user("a", "hello"));

        assert_eq!(registry.conversation(1).lock().await.len(), 1);
        assert!(registry.conversation(2).lock().await.is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn registry_cap_applies_to_new_conversations() {
        let registry = TranscriptRegistry::new(Some(20));
        let convo = registry.conversation(9);
        let mut guard = convo.lock().await;

        for i in 0..24 {
            guard.append(TranscriptEntry::user("a", format!("{}", i)));
        }

        assert_eq!(guard.len(), 20);
        assert_eq!(guard.entries()[0].content, "4");
    }

    #[tokio::test]
    async fn concurrent_appends_keep_each_batch_contiguous() {
        let registry = Arc::new(TranscriptRegistry::new(None));

        let mut handles = Vec::new();
        for batch in 0..4 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let convo = registry.conversation(5);
                let mut guard = convo.lock().await;
                for i in 0..10 {
                    guard.append(TranscriptEntry::user(format!("batch{}", batch), format!("{}", i)));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let convo = registry.conversation(5);
        let guard = convo.lock().await;
        assert_eq!(guard.len(), 40);
        for chunk in guard.entries().chunks(10) {
            assert!(chunk.iter().all(|e| e.author_name == chunk[0].author_name));
        }
    }
}
