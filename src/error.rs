//! Error types for chlog modules using thiserror.

use thiserror::Error;

/// Errors from reading the staged diff.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("No changes to describe (nothing staged and the working tree is clean)")]
    NoChanges,

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to read Claude output: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from Codex CLI operations.
#[derive(Error, Debug)]
pub enum CodexError {
    #[error(
        "Codex CLI not found. Install with: npm install -g @openai/codex (then run `codex` or set CODEX_API_KEY)"
    )]
    NotInstalled,

    #[error("Failed to spawn Codex process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to read Codex output: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Codex process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Codex CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from a model client while streaming a response.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Claude(#[from] ClaudeError),

    #[error(transparent)]
    Codex(#[from] CodexError),

    #[error("All {attempts} attempts failed: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ModelError>,
    },

    #[error("Both model providers failed. {primary} error: {primary_error}. {fallback} error: {fallback_error}.")]
    AllProvidersFailed {
        primary: String,
        primary_error: Box<ModelError>,
        fallback: String,
        fallback_error: Box<ModelError>,
    },
}

impl ModelError {
    /// Whether another attempt against the same provider could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Claude(ClaudeError::NotInstalled)
            | ModelError::Codex(CodexError::NotInstalled) => false,
            ModelError::Claude(ClaudeError::SpawnFailed(_))
            | ModelError::Codex(CodexError::SpawnFailed(_)) => false,
            ModelError::RetriesExhausted { .. } | ModelError::AllProvidersFailed { .. } => false,
            _ => true,
        }
    }
}

/// Errors from resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown model provider '{0}'. Expected one of: claude, codex")]
    UnknownProvider(String),

    #[error("Fallback provider '{0}' is the same as the primary provider")]
    FallbackSameAsPrimary(String),
}

/// Errors from the generation pipeline.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(
        "No language model configured. Pass --provider claude|codex or set CHLOG_PROVIDER."
    )]
    NoModelConfigured,

    #[error("Failed to build the ChangeLog scaffold: {0}")]
    Scaffold(#[from] DiffError),

    #[error("Model request failed: {0}")]
    Model(#[from] ModelError),
}
