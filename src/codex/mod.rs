//! Codex CLI integration.

pub mod subprocess;

pub use subprocess::{CodexClient, check_codex_installed, run_codex_streaming};
