//! Claude CLI integration.

pub mod stream;
pub mod subprocess;

pub use stream::apply_event;
pub use subprocess::{ClaudeClient, check_claude_installed, run_claude_streaming};
