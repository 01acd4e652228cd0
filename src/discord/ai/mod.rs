// Discord AI module
//
// Answers mentions with the AI service and runs the importer when the model
// asks for it.

#[path = "mention_handler.rs"]
pub mod mention_handler;

pub use mention_handler::handle_mention;
