//! Parsing of Claude CLI `--output-format stream-json` events.

use serde::Deserialize;
use tracing::debug;

use crate::error::ClaudeError;
use crate::llm::StreamSink;

/// One line of `stream-json` output.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    Assistant {
        message: AssistantMessage,
    },
    Result {
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        result: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Apply one `stream-json` line to the sink.
///
/// Text blocks of assistant messages are appended. A `result` event flagged
/// as an error fails the stream. Lines that are not JSON are ignored.
pub fn apply_event(line: &str, sink: &mut dyn StreamSink) -> Result<(), ClaudeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    let event: StreamEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(e) => {
            debug!("Ignoring non-JSON Claude output line ({e}): {line}");
            return Ok(());
        }
    };

    match event {
        StreamEvent::Assistant { message } => {
            for block in message.content {
                if let ContentBlock::Text { text } = block {
                    sink.append(&text);
                }
            }
            Ok(())
        }
        StreamEvent::Result { is_error: true, result } => Err(ClaudeError::ExecutionFailed(
            result.unwrap_or_else(|| "unknown error".to_string()),
        )),
        StreamEvent::Result { .. } | StreamEvent::Other => Ok(()),
    }
}
