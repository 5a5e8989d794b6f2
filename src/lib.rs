//! chlog - A CLI tool that writes ChangeLog-style commit messages from staged changes.
//!
//! # Overview
//!
//! chlog reads the project's commit-message guidelines, scaffolds a ChangeLog
//! entry for every changed file, asks a language model (Claude Code or Codex
//! CLI) to fill it in, and reformats the streamed answer so that every
//! `(symbol):` description starts its own line and every line is filled.

pub mod changelog;
pub mod claude;
pub mod codex;
pub mod config;
pub mod context;
pub mod error;
pub mod generate;
pub mod git;
pub mod guidelines;
pub mod llm;
pub mod prompt;

// Re-export commonly used types
pub use changelog::{FillOptions, format_message};
pub use config::Config;
pub use context::{ContextCollector, ContextSource};
pub use error::{ClaudeError, CodexError, ConfigError, DiffError, GenerateError, ModelError};
pub use generate::{Collaborators, generate, prepare_prompt};
pub use llm::{ModelClient, OutputBuffer, StreamSink};
