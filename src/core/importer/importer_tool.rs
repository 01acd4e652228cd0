// Function-calling surface of the importer.
//
// The descriptor is what the model sees; `handle_tool_call` is what runs when
// the model decides to call it.

use super::importer_backend::{BackendError, MessageBackend};
use super::importer_service::{MessageImporter, DEFAULT_IMPORT_COUNT, MAX_IMPORT_COUNT};
use crate::core::ai::{PropertySchema, ToolCall, ToolDescriptor};
use crate::core::transcript::Transcript;
use serde::Deserialize;
use serde_json::json;

pub const FETCH_MESSAGES_TOOL: &str = "fetch_and_insert_messages";

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Arguments the model supplies when calling the importer.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FetchMessagesArgs {
    pub query: String,
    #[serde(alias = "channelName")]
    pub channel_name: String,
    #[serde(default = "default_num_messages", alias = "numMessages")]
    pub num_messages: u32,
}

fn default_num_messages() -> u32 {
    DEFAULT_IMPORT_COUNT
}

impl FetchMessagesArgs {
    pub fn parse(arguments: &str) -> Result<Self, ToolError> {
        // Some models send an empty string instead of "{}" when they omit everything.
        let raw = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };
        Ok(serde_json::from_str(raw)?)
    }
}

/// The descriptor advertised to the model for the importer.
pub fn fetch_messages_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        FETCH_MESSAGES_TOOL,
        "Fetch messages based on a query and insert them into the conversation context.",
    )
    .property(
        "query",
        PropertySchema::new("string", "The query to evaluate which messages to fetch."),
        true,
    )
    .property(
        "channel_name",
        PropertySchema::new("string", "The name of the channel to fetch messages from."),
        true,
    )
    .property(
        "num_messages",
        PropertySchema::new(
            "integer",
            format!(
                "The number of messages to fetch and insert (max {}).",
                MAX_IMPORT_COUNT
            ),
        )
        .with_default(json!(DEFAULT_IMPORT_COUNT)),
        false,
    )
}

impl<B: MessageBackend> MessageImporter<B> {
    /// Execute a tool call from the model against `transcript`.
    ///
    /// Returns the status string that should be reported back to the model.
    pub async fn handle_tool_call<T: Transcript + ?Sized>(
        &self,
        guild_id: u64,
        call: &ToolCall,
        transcript: &mut T,
    ) -> Result<String, ToolError> {
        if call.name != FETCH_MESSAGES_TOOL {
            return Err(ToolError::UnknownTool(call.name.clone()));
        }

        let args = FetchMessagesArgs::parse(&call.arguments)?;

        let status = self
            .import_and_report(
                guild_id,
                &args.query,
                &args.channel_name,
                Some(args.num_messages),
                transcript,
            )
            .await?;

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript::TranscriptEntry;
    use crate::infra::importer::InMemoryMessageBackend;

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn descriptor_matches_call_contract() {
        let value = serde_json::to_value(fetch_messages_tool()).unwrap();

        assert_eq!(value["name"], "fetch_and_insert_messages");
        assert_eq!(value["parameters"]["type"], "object");
        assert_eq!(
            value["parameters"]["properties"]["num_messages"]["type"],
            "integer"
        );
        assert_eq!(
            value["parameters"]["properties"]["num_messages"]["default"],
            20
        );
        assert_eq!(value["parameters"]["required"], json!(["query", "channel_name"]));
    }

    #[test]
    fn args_default_and_aliases() {
        let args = FetchMessagesArgs::parse(r#"{"query":"release","channel_name":"dev"}"#).unwrap();
        assert_eq!(args.num_messages, 20);

        let args =
            FetchMessagesArgs::parse(r#"{"query":"q","channelName":"dev","numMessages":3}"#)
                .unwrap();
        assert_eq!(args.channel_name, "dev");
        assert_eq!(args.num_messages, 3);
    }

    #[test]
    fn missing_channel_name_is_rejected() {
        let err = FetchMessagesArgs::parse(r#"{"query":"q"}"#).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));

        let err = FetchMessagesArgs::parse("").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn tool_call_runs_importer() {
        let backend = InMemoryMessageBackend::new();
        let general = backend.add_channel(7, "general");
        for i in 0..30 {
            backend.push_message(general.id, "alice", format!("m{}", i));
        }
        let importer = MessageImporter::new(backend);
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let status = importer
            .handle_tool_call(
                7,
                &call(
                    FETCH_MESSAGES_TOOL,
                    r#"{"query":"latest","channel_name":"general","num_messages":50}"#,
                ),
                &mut transcript,
            )
            .await
            .unwrap();

        assert_eq!(
            status,
            "Inserted 20 messages from 'general' into the conversation context."
        );
        assert_eq!(transcript.len(), 20);
        assert_eq!(transcript[0].content, "m29");
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let importer = MessageImporter::new(InMemoryMessageBackend::new());
        let mut transcript: Vec<TranscriptEntry> = Vec::new();

        let err = importer
            .handle_tool_call(7, &call("delete_everything", "{}"), &mut transcript)
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "delete_everything"));
    }
}
