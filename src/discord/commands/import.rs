// Slash command front-end for the importer.
//
// Same pattern as every command: pull primitives out of Discord types, call the
// core service, report the result. The status string is the reply.

use crate::discord::{Context, Error};

/// Import recent messages from another channel into this channel's AI context.
#[poise::command(slash_command, guild_only)]
pub async fn import(
    ctx: Context<'_>,
    #[description = "Exact name of the text channel to import from"] channel: String,
    #[description = "How many recent messages to import (max 20)"] count: Option<u32>,
    #[description = "What you're looking for"] query: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.defer().await?;

    let conversation = ctx.data().transcripts.conversation(ctx.channel_id().get());
    let status = {
        let mut transcript = conversation.lock().await;
        ctx.data()
            .importer
            .import_and_report(
                guild_id,
                query.as_deref().unwrap_or_default(),
                &channel,
                count,
                &mut *transcript,
            )
            .await?
    };

    ctx.say(status).await?;

    Ok(())
}
