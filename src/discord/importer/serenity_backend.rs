// Serenity implementation of MessageBackend.
//
// Channel lookups try the gateway cache first and fall back to the HTTP API
// when the guild isn't cached yet. History always comes from HTTP, which
// doesn't attach member data to messages, so nicknames are looked up
// separately (cache, then HTTP) once per author per call.

use crate::core::importer::{BackendError, ChannelHandle, MessageBackend, MessageRecord};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use std::sync::Arc;

/// Discord caps a single history request at 100 messages.
const DISCORD_HISTORY_LIMIT: usize = 100;

pub struct SerenityBackend {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityBackend {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }

    /// Server nickname for `user_id`, or `None` if they have none or aren't a
    /// member any more.
    async fn nickname(&self, guild_id: serenity::GuildId, user_id: serenity::UserId) -> Option<String> {
        let cached = {
            self.cache
                .member(guild_id, user_id)
                .map(|member| member.nick.clone())
        };
        if let Some(nick) = cached {
            return nick;
        }

        match self.http.get_member(guild_id, user_id).await {
            Ok(member) => member.nick,
            Err(e) => {
                tracing::debug!(
                    guild_id = guild_id.get(),
                    user_id = user_id.get(),
                    "Member lookup failed, using account name: {}",
                    e
                );
                None
            }
        }
    }
}

/// The parts of a guild channel that matter for name lookup.
#[derive(Debug, Clone, Copy)]
struct ChannelCandidate<'a> {
    id: u64,
    guild_id: u64,
    kind: serenity::ChannelType,
    name: &'a str,
    position: u16,
}

impl<'a> From<&'a serenity::GuildChannel> for ChannelCandidate<'a> {
    fn from(channel: &'a serenity::GuildChannel) -> Self {
        Self {
            id: channel.id.get(),
            guild_id: channel.guild_id.get(),
            kind: channel.kind,
            name: &channel.name,
            position: channel.position,
        }
    }
}

/// Channels that hold a readable message history: plain text and announcement.
fn is_text_like(kind: serenity::ChannelType) -> bool {
    matches!(kind, serenity::ChannelType::Text | serenity::ChannelType::News)
}

/// Pick the text channel called `name`, preferring the one listed first in the
/// sidebar when several share a name.
fn find_text_channel_in<'a>(
    channels: impl Iterator<Item = ChannelCandidate<'a>>,
    name: &str,
) -> Option<ChannelHandle> {
    channels
        .filter(|c| is_text_like(c.kind) && c.name == name)
        .min_by_key(|c| (c.position, c.id))
        .map(|c| ChannelHandle {
            id: c.id,
            guild_id: c.guild_id,
            name: c.name.to_string(),
        })
}

/// Server nickname if there is one, then global display name, then username.
fn display_name(nickname: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    nickname.or(global_name).unwrap_or(username).to_string()
}

fn to_record(msg: &serenity::Message, nickname: Option<&str>) -> MessageRecord {
    MessageRecord {
        content: msg.content.clone(),
        author_name: display_name(nickname, msg.author.global_name.as_deref(), &msg.author.name),
        sent_at: chrono::DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or_default(),
    }
}

#[async_trait]
impl MessageBackend for SerenityBackend {
    async fn find_text_channel(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<ChannelHandle>, BackendError> {
        let guild_id = serenity::GuildId::new(guild_id);

        // The cache guard isn't Send, so resolve and drop it before any await
        let cached = {
            self.cache.guild(guild_id).map(|guild| {
                find_text_channel_in(guild.channels.values().map(ChannelCandidate::from), name)
            })
        };
        if let Some(found) = cached {
            return Ok(found);
        }

        tracing::debug!(guild_id = guild_id.get(), "Guild not cached, listing channels over HTTP");
        let channels = guild_id
            .channels(&self.http)
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        Ok(find_text_channel_in(
            channels.values().map(ChannelCandidate::from),
            name,
        ))
    }

    async fn fetch_history(
        &self,
        channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, BackendError> {
        let limit = limit.min(DISCORD_HISTORY_LIMIT) as u8;

        let messages = serenity::ChannelId::new(channel.id)
            .messages(&self.http, serenity::GetMessages::new().limit(limit))
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let guild_id = serenity::GuildId::new(channel.guild_id);
        let mut nicknames: HashMap<serenity::UserId, Option<String>> = HashMap::new();
        let mut records = Vec::with_capacity(messages.len());

        for msg in &messages {
            let author = msg.author.id;
            if !nicknames.contains_key(&author) {
                let nick = match msg.member.as_ref() {
                    Some(member) => member.nick.clone(),
                    // Webhook authors aren't guild members
                    None if msg.webhook_id.is_some() => None,
                    None => self.nickname(guild_id, author).await,
                };
                nicknames.insert(author, nick);
            }

            let nick = nicknames.get(&author).and_then(|n| n.as_deref());
            records.push(to_record(msg, nick));
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use self::serenity::ChannelType;

    fn candidate(id: u64, kind: ChannelType, name: &str, position: u16) -> ChannelCandidate<'_> {
        ChannelCandidate {
            id,
            guild_id: 7,
            kind,
            name,
            position,
        }
    }

    #[test]
    fn announcement_channels_are_importable() {
        assert!(is_text_like(ChannelType::Text));
        assert!(is_text_like(ChannelType::News));
        assert!(!is_text_like(ChannelType::Voice));
        assert!(!is_text_like(ChannelType::Category));

        let channels = [candidate(10, ChannelType::News, "announcements", 0)];
        let found = find_text_channel_in(channels.into_iter(), "announcements");

        assert_eq!(
            found,
            Some(ChannelHandle {
                id: 10,
                guild_id: 7,
                name: "announcements".to_string(),
            })
        );
    }

    #[test]
    fn voice_channels_with_the_name_are_skipped() {
        let channels = [
            candidate(1, ChannelType::Voice, "general", 0),
            candidate(2, ChannelType::Text, "general", 3),
        ];
        let found = find_text_channel_in(channels.into_iter(), "general");
        assert_eq!(found.map(|c| c.id), Some(2));
    }

    #[test]
    fn duplicate_names_resolve_to_topmost_channel() {
        let channels = [
            candidate(30, ChannelType::Text, "general", 2),
            candidate(20, ChannelType::News, "general", 1),
            candidate(10, ChannelType::Text, "general", 1),
        ];
        let found = find_text_channel_in(channels.into_iter(), "general");
        assert_eq!(found.map(|c| c.id), Some(10));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let channels = [candidate(1, ChannelType::Text, "general", 0)];
        assert_eq!(find_text_channel_in(channels.into_iter(), "General"), None);
    }

    #[test]
    fn nickname_beats_global_name_beats_username() {
        assert_eq!(display_name(Some("Ally"), Some("Alice"), "alice_u"), "Ally");
        assert_eq!(display_name(None, Some("Alice"), "alice_u"), "Alice");
        assert_eq!(display_name(None, None, "alice_u"), "alice_u");
    }
}
