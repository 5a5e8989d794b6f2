//! The model client seam and the buffer its output streams into.

use std::io::Write;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ModelError;

/// Echoed when streamed text that was already shown is thrown away.
pub const DISCARD_MARKER: &str = "\n[chlog: discarding partial output]\n";

/// Destination of a streamed model response.
pub trait StreamSink: Send {
    /// Append a chunk of generated text.
    fn append(&mut self, chunk: &str);

    /// Discard everything appended so far.
    fn clear(&mut self);
}

/// A language model that streams its response into a [`StreamSink`].
///
/// `stream` appends text as it arrives and returns once the response is
/// complete. Returning `Ok(())` is the completion event; an error means the
/// response never completed.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Human-readable name used in logs and error messages.
    fn name(&self) -> String;

    async fn stream(&self, prompt: &str, sink: &mut dyn StreamSink) -> Result<(), ModelError>;
}

/// The single output location of a generation request.
///
/// Receives streamed chunks and, once the stream completes, is rewritten in
/// place with the formatted message. Chunks can be echoed to a writer (the
/// terminal) as they arrive.
#[derive(Default)]
pub struct OutputBuffer {
    text: String,
    echo: Option<Box<dyn Write + Send>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer that also writes every appended chunk to `writer`.
    pub fn echoing(writer: impl Write + Send + 'static) -> Self {
        Self {
            text: String::new(),
            echo: Some(Box::new(writer)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the whole contents without echoing.
    pub fn replace(&mut self, text: String) {
        self.text = text;
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl StreamSink for OutputBuffer {
    fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        if let Some(writer) = self.echo.as_mut() {
            if let Err(e) = writer.write_all(chunk.as_bytes()).and_then(|()| writer.flush()) {
                debug!("Failed to echo streamed output: {e}");
            }
        }
    }

    fn clear(&mut self) {
        if !self.text.is_empty()
            && let Some(writer) = self.echo.as_mut()
            && let Err(e) = writer
                .write_all(DISCARD_MARKER.as_bytes())
                .and_then(|()| writer.flush())
        {
            debug!("Failed to echo discard marker: {e}");
        }
        self.text.clear();
    }
}

impl std::fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("text", &self.text)
            .field("echo", &self.echo.is_some())
            .finish()
    }
}
