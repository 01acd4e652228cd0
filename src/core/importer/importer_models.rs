use chrono::{DateTime, Utc};

/// A text channel resolved by name within a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: u64,
    pub guild_id: u64,
    pub name: String,
}

/// A single message as delivered by the backend's history call.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub content: String,
    /// Display name of the author (server nickname, global name, or username).
    pub author_name: String,
    pub sent_at: DateTime<Utc>,
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub channel_name: String,
    pub inserted: usize,
}

impl ImportOutcome {
    /// The confirmation string handed back to callers of the tool.
    pub fn status_message(&self) -> String {
        format!(
            "Inserted {} messages from '{}' into the conversation context.",
            self.inserted, self.channel_name
        )
    }
}
