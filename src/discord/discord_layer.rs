// Discord layer - commands, event handlers and the serenity-backed adapters.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "importer/mod.rs"]
pub mod importer;

use crate::core::ai::AiService;
use crate::core::importer::MessageImporter;
use crate::infra::ai::OpenRouterClient;
use crate::infra::transcript::TranscriptRegistry;
use importer::SerenityBackend;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event.
pub struct Data {
    pub ai: Arc<AiService<OpenRouterClient>>,
    pub importer: Arc<MessageImporter<SerenityBackend>>,
    pub transcripts: Arc<TranscriptRegistry>,
    /// How many live channel messages to include when the bot is mentioned.
    pub max_history: u8,
}
