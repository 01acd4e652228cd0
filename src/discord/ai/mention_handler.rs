// Mention handler
//
// When someone mentions the bot we send the channel's stored transcript plus
// the most recent live messages to the AI. The model may ask to pull in
// messages from another channel through the importer tool; those land in the
// channel's transcript and the model is asked again with the updated context
// plus the result of each call.

use crate::core::ai::{AiMessage, AiProvider, AiResponse, AiService, ToolDescriptor};
use crate::core::importer::{fetch_messages_tool, MessageBackend, MessageImporter};
use crate::core::transcript::Conversation;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Upper bound on model round-trips spent executing tool calls per mention.
pub const MAX_TOOL_ROUNDS: usize = 3;

/// Discord rejects messages longer than this.
const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Discord rejects embed descriptions longer than 4096; leave room for "...".
const REASONING_LIMIT: usize = 4000;

pub async fn handle_mention(
    ctx: &serenity::Context,
    new_message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    let _ = new_message.channel_id.broadcast_typing(&ctx.http).await;

    match converse(ctx, new_message, data).await {
        Ok(response) => send_response(ctx, new_message, response).await,
        Err(e) => {
            tracing::error!("AI error: {}", e);
            new_message
                .reply(
                    &ctx.http,
                    "Sorry, I encountered an error processing your request.",
                )
                .await?;
        }
    }

    Ok(())
}

async fn converse(
    ctx: &serenity::Context,
    new_message: &serenity::Message,
    data: &Data,
) -> Result<AiResponse, Error> {
    let bot_id = ctx.cache.current_user().id;

    let history = new_message
        .channel_id
        .messages(
            &ctx.http,
            serenity::GetMessages::new().limit(data.max_history),
        )
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch channel history for mention: {}", e);
            Vec::new()
        });
    let live_context = history_to_ai_messages(&history, bot_id);

    // Hold the channel's transcript for the whole exchange so imports from
    // concurrent mentions don't interleave.
    let conversation = data.transcripts.conversation(new_message.channel_id.get());
    let mut transcript = conversation.lock().await;

    run_tool_rounds(
        data.ai.as_ref(),
        data.importer.as_ref(),
        new_message.guild_id.map(|id| id.get()),
        &mut *transcript,
        &live_context,
    )
    .await
}

/// Ask the model, executing importer calls it makes, until it answers.
///
/// Channel names only resolve inside a guild, so with no `guild_id` the model
/// gets no tools and is asked once. Otherwise at most [`MAX_TOOL_ROUNDS`]
/// rounds of calls are executed; the last re-ask offers no tools so the model
/// has to answer. A failed call is reported back to the model as its result.
pub async fn run_tool_rounds<P: AiProvider, B: MessageBackend>(
    ai: &AiService<P>,
    importer: &MessageImporter<B>,
    guild_id: Option<u64>,
    transcript: &mut Conversation,
    live_context: &[AiMessage],
) -> Result<AiResponse, Error> {
    let tools = match guild_id {
        Some(_) => vec![fetch_messages_tool()],
        None => Vec::new(),
    };

    let mut exchange: Vec<AiMessage> = Vec::new();
    let mut response = ai
        .chat(&build_request(transcript, live_context, &exchange), &tools)
        .await?;

    let Some(guild_id) = guild_id else {
        return Ok(response);
    };

    let mut rounds = 0;
    while !response.tool_calls.is_empty() && rounds < MAX_TOOL_ROUNDS {
        rounds += 1;

        exchange.push(AiMessage::assistant_tool_calls(
            response.answer.clone(),
            response.tool_calls.clone(),
        ));

        for call in &response.tool_calls {
            let result = match importer.handle_tool_call(guild_id, call, transcript).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(
                        tool = %call.name,
                        guild_id,
                        "Tool call failed: {}",
                        e
                    );
                    format!("Tool call failed: {}", e)
                }
            };

            exchange.push(AiMessage::tool_result(call.id.clone(), result));
        }

        // Last round: make the model answer with what it has
        let round_tools: &[ToolDescriptor] = if rounds < MAX_TOOL_ROUNDS {
            tools.as_slice()
        } else {
            &[]
        };
        response = ai
            .chat(&build_request(transcript, live_context, &exchange), round_tools)
            .await?;
    }

    Ok(response)
}

/// Convert channel history (newest first) into oldest -> newest AI messages.
fn history_to_ai_messages(messages: &[serenity::Message], bot_id: serenity::UserId) -> Vec<AiMessage> {
    messages
        .iter()
        .rev()
        .map(|msg| {
            if msg.author.id == bot_id {
                AiMessage::assistant(msg.content.clone())
            } else {
                AiMessage::user(format!("{}: {}", msg.author.name, msg.content))
            }
        })
        .collect()
}

/// Transcript first (imported background), then the live conversation, then
/// the tool calls made so far with their results.
fn build_request(
    transcript: &Conversation,
    live_context: &[AiMessage],
    exchange: &[AiMessage],
) -> Vec<AiMessage> {
    let mut messages = transcript.to_ai_messages();
    messages.extend(live_context.iter().cloned());
    messages.extend(exchange.iter().cloned());
    messages
}

/// Split text into pieces Discord will accept, on char boundaries.
fn split_for_discord(text: &str) -> Vec<String> {
    text.chars()
        .collect::<Vec<char>>()
        .chunks(DISCORD_MESSAGE_LIMIT)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

async fn send_response(ctx: &serenity::Context, new_message: &serenity::Message, response: AiResponse) {
    if let Some(reasoning) = response.reasoning {
        let mut reasoning_text: String = reasoning.chars().take(REASONING_LIMIT).collect();
        if reasoning_text.len() < reasoning.len() {
            reasoning_text.push_str("...");
        }

        let embed = serenity::CreateEmbed::new()
            .title("🧠 Reasoning")
            .description(reasoning_text)
            .color(0xDAA520);

        if let Err(e) = new_message
            .channel_id
            .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
            .await
        {
            tracing::error!("Failed to send reasoning embed: {}", e);
        }
    }

    for chunk in split_for_discord(&response.answer) {
        if let Err(e) = new_message.channel_id.say(&ctx.http, chunk).await {
            tracing::error!("Failed to send AI response: {}", e);
        }
    }
}
