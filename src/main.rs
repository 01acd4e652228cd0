// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic): the message importer,
//   transcripts, and the AI service
// - `infra/` = Implementations of core traits (OpenRouter, in-memory stores)
// - `discord/` = Discord-specific adapters (commands, events, serenity backend)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::ai::{AiConfig, AiService};
use crate::core::importer::MessageImporter;
use crate::core::transcript::Conversation;
use crate::discord::importer::SerenityBackend;
use crate::discord::{Data, Error};
use crate::infra::ai::OpenRouterClient;
use crate::infra::transcript::TranscriptRegistry;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. When a question needs \
     background from another channel, call fetch_and_insert_messages with that channel's name.";
const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";
const DEFAULT_MAX_HISTORY: u8 = 50;
const DEFAULT_TRANSCRIPT_MAX_ENTRIES: usize = 200;

/// Everything read from the environment at startup.
struct Settings {
    discord_token: String,
    openrouter_api_key: String,
    ai_config: AiConfig,
    system_prompt: String,
    max_history: u8,
    transcript_max_entries: usize,
    dev_guild_id: Option<u64>,
}

/// Discord's history endpoint tops out at 100 messages per request.
const MAX_HISTORY_LIMIT: u32 = 100;

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Live-history size for mentions. Values above Discord's limit are clamped
/// rather than discarded; anything unparseable falls back to the default.
fn parse_max_history(raw: Option<&str>) -> u8 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .map(|n| n.min(MAX_HISTORY_LIMIT) as u8)
        .unwrap_or(DEFAULT_MAX_HISTORY)
}

/// Snowflakes are never 0, and `GuildId::new` panics on it, so 0 means unset.
fn parse_guild_id(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&id| id != 0)
}

impl Settings {
    fn from_env() -> anyhow::Result<Self> {
        let discord_token = std::env::var("DISCORD_TOKEN").context(
            "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
        )?;
        let openrouter_api_key = std::env::var("OPENROUTER_API_KEY")
            .context("Missing OPENROUTER_API_KEY environment variable!")?;

        let system_prompt = if let Ok(path) = std::env::var("OPENROUTER_SYSTEM_PROMPT_FILE") {
            std::fs::read_to_string(&path).unwrap_or_else(|e| {
                tracing::warn!("Failed to read system prompt file at {}: {}", path, e);
                DEFAULT_SYSTEM_PROMPT.to_string()
            })
        } else {
            std::env::var("OPENROUTER_SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string())
        };

        let ai_config = AiConfig {
            model: std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: 0.7,
            max_tokens: None,
            top_p: Some(1.0),
            repetition_penalty: Some(1.0),
            reasoning_enabled: env_parse("OPENROUTER_REASONING_ENABLED"),
            reasoning_effort: std::env::var("OPENROUTER_REASONING_EFFORT").ok(),
        };

        Ok(Self {
            discord_token,
            openrouter_api_key,
            ai_config,
            system_prompt,
            max_history: parse_max_history(std::env::var("OPENROUTER_MAX_HISTORY").ok().as_deref()),
            transcript_max_entries: env_parse("TRANSCRIPT_MAX_ENTRIES")
                .unwrap_or(DEFAULT_TRANSCRIPT_MAX_ENTRIES),
            dev_guild_id: parse_guild_id(std::env::var("DEV_GUILD_ID").ok().as_deref()),
        })
    }
}

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // Ignore bot messages (including our own)
        if new_message.author.bot {
            return Ok(());
        }

        let bot_id = ctx.cache.current_user().id;
        if new_message.mentions.iter().any(|u| u.id == bot_id) {
            if let Err(e) = discord::ai::handle_mention(ctx, new_message, data).await {
                tracing::error!("Error handling mention: {}", e);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Services that don't need a live Discord connection are built here; the
    // importer needs the client's HTTP handle and cache, so it's wired in setup.

    let ai_client = OpenRouterClient::new(settings.openrouter_api_key);
    let ai_service = Arc::new(AiService::new(
        ai_client,
        settings.system_prompt,
        settings.ai_config,
    ));
    let requested_cap = Some(settings.transcript_max_entries);
    let transcript_cap = Conversation::effective_cap(requested_cap);
    if transcript_cap != requested_cap && transcript_cap.is_some() {
        tracing::warn!(
            requested = settings.transcript_max_entries,
            effective = ?transcript_cap,
            "TRANSCRIPT_MAX_ENTRIES is below one full import; raising it"
        );
    }
    let transcripts = Arc::new(TranscriptRegistry::new(requested_cap));
    let max_history = settings.max_history;
    let dev_guild_id = settings.dev_guild_id;

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS // Channel names for the importer's cache lookups
        | serenity::GatewayIntents::DIRECT_MESSAGES;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::import::import(),
                discord::commands::context::context(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                match dev_guild_id {
                    // Guild registration is instant, handy while developing
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?
                    }
                    // Global registration can take up to an hour to propagate
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?
                    }
                }
                tracing::info!(dev_guild_id, "Commands registered");

                let backend = SerenityBackend::new(ctx.http.clone(), ctx.cache.clone());
                let importer = Arc::new(MessageImporter::new(backend));

                Ok(Data {
                    ai: ai_service,
                    importer,
                    transcripts,
                    max_history,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(settings.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;

    Ok(())
}
