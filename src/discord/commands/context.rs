use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// How many entries `/context show` previews.
const PREVIEW_ENTRIES: usize = 5;

/// Longest preview line before it gets cut.
const PREVIEW_CHARS: usize = 80;

/// Inspect or reset the AI context for this channel.
#[poise::command(slash_command, guild_only, subcommands("show", "clear"))]
pub async fn context(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show what the AI currently has in this channel's context.
#[poise::command(slash_command, guild_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let conversation = ctx.data().transcripts.conversation(ctx.channel_id().get());
    let (total, updated_at, preview) = {
        let transcript = conversation.lock().await;
        let preview: Vec<String> = transcript
            .entries()
            .iter()
            .rev()
            .take(PREVIEW_ENTRIES)
            .map(|entry| {
                let mut line: String = entry.content.chars().take(PREVIEW_CHARS).collect();
                if line.len() < entry.content.len() {
                    line.push('…');
                }
                format!("**{}** ({}): {}", entry.author_name, entry.role.as_str(), line)
            })
            .collect();
        (transcript.len(), transcript.updated_at(), preview)
    };

    let last_updated = updated_at
        .map(|ts| format!("<t:{}:R>", ts.timestamp()))
        .unwrap_or_else(|| "Never".to_string());

    let latest = if preview.is_empty() {
        "_Nothing imported yet. Try `/import`._".to_string()
    } else {
        preview.join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title("🧾 Conversation Context")
        .color(serenity::Color::BLURPLE)
        .field("Entries", total.to_string(), true)
        .field("Last updated", last_updated, true)
        .field("Latest entries", latest, false)
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Forget everything in this channel's AI context.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn clear(ctx: Context<'_>) -> Result<(), Error> {
    let conversation = ctx.data().transcripts.conversation(ctx.channel_id().get());
    let removed = {
        let mut transcript = conversation.lock().await;
        let removed = transcript.len();
        transcript.clear();
        removed
    };

    tracing::info!(
        channel_id = ctx.channel_id().get(),
        removed,
        "Cleared conversation context"
    );

    ctx.say(format!("🧹 Cleared {} entries from this channel's context.", removed))
        .await?;
    Ok(())
}
