pub mod transcript_models;

pub use transcript_models::{Conversation, Role, Transcript, TranscriptEntry};
