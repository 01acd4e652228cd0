use super::importer_models::{ChannelHandle, MessageRecord};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(String),
}

/// Port for the messaging platform the importer reads from.
#[async_trait]
pub trait MessageBackend: Send + Sync {
    /// Look up a text channel by exact (case-sensitive) name within a guild.
    /// Returns `None` when no text channel has that name.
    async fn find_text_channel(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<ChannelHandle>, BackendError>;

    /// Fetch up to `limit` of the most recent messages, newest first.
    async fn fetch_history(
        &self,
        channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, BackendError>;
}
