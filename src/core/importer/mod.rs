pub mod importer_backend;
pub mod importer_models;
pub mod importer_service;
pub mod importer_tool;

pub use importer_backend::{BackendError, MessageBackend};
pub use importer_models::{ChannelHandle, ImportOutcome, MessageRecord};
pub use importer_service::{ImportError, MessageImporter};
pub use importer_tool::{fetch_messages_tool, ToolError, FETCH_MESSAGES_TOOL};
