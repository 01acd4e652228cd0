pub mod ai_service;
pub mod models;
pub mod tools;

pub use ai_service::{AiProvider, AiService};
pub use models::{AiConfig, AiMessage, AiProviderResponse, AiResponse};
pub use tools::{PropertySchema, ToolCall, ToolDescriptor};
