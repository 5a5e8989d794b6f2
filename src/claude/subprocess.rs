//! Claude CLI spawning.

use std::env;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{ClaudeError, ModelError};
use crate::llm::{ModelClient, StreamSink};

use super::stream::apply_event;

/// Default timeout for Claude subprocess execution (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "CHLOG_CLAUDE_TIMEOUT";

/// Get the configured timeout duration.
///
/// Reads from CHLOG_CLAUDE_TIMEOUT environment variable if set,
/// otherwise uses the default of 300 seconds.
///
/// Logs a warning if the environment variable is set but contains
/// an invalid value (non-numeric, empty, or negative).
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Check if Claude Code CLI is installed and accessible.
///
/// Uses the `which` crate for cross-platform executable detection.
pub async fn check_claude_installed() -> Result<(), ClaudeError> {
    if which::which("claude").is_err() {
        return Err(ClaudeError::NotInstalled);
    }

    // Verify it actually runs (check version)
    let version_check = Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map_err(ClaudeError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(ClaudeError::NotInstalled);
    }

    Ok(())
}

/// Run Claude CLI with a prompt, streaming the response into `sink`.
///
/// Uses `-p` with `--output-format stream-json`, which emits one JSON event
/// per line while the response is being produced. Text is appended to the
/// sink as each assistant message arrives; the function returns once the
/// process exits successfully.
///
/// # Timeout
///
/// The whole stream has a default timeout of 5 minutes (300 seconds),
/// configurable via `CHLOG_CLAUDE_TIMEOUT` (value in seconds). On timeout the
/// process is killed and `ClaudeError::Timeout` is returned.
pub async fn run_claude_streaming(
    prompt: &str,
    model: Option<&str>,
    sink: &mut dyn StreamSink,
) -> Result<(), ClaudeError> {
    let timeout_duration = get_timeout();
    let timeout_secs = timeout_duration.as_secs();

    let mut cmd = Command::new("claude");
    cmd.arg("-p")
        .arg(prompt)
        .arg("--output-format")
        .arg("stream-json")
        .arg("--verbose");
    if let Some(model) = model {
        cmd.arg("--model").arg(model);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(ClaudeError::SpawnFailed)?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ClaudeError::ExecutionFailed("stdout was not captured".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ClaudeError::ExecutionFailed("stderr was not captured".to_string()))?;

    // Drain stderr concurrently so a chatty process cannot block on a full pipe.
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).to_string()
    });

    let streamed = timeout(timeout_duration, async {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await.map_err(ClaudeError::ReadFailed)? {
            apply_event(&line, sink)?;
        }
        child.wait().await.map_err(ClaudeError::ReadFailed)
    })
    .await;

    let status = match streamed {
        Ok(result) => result?,
        Err(_) => {
            stderr_task.abort();
            return Err(ClaudeError::Timeout(timeout_secs));
        }
    };

    if !status.success() {
        let stderr = stderr_task.await.unwrap_or_default();
        let code = status.code().unwrap_or(-1);
        return Err(ClaudeError::NonZeroExit { code, stderr });
    }

    debug!("Claude stream completed");
    Ok(())
}

/// Model client backed by the Claude Code CLI.
#[derive(Debug, Clone, Default)]
pub struct ClaudeClient {
    model: Option<String>,
}

impl ClaudeClient {
    pub fn new(model: Option<String>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ModelClient for ClaudeClient {
    fn name(&self) -> String {
        match &self.model {
            Some(model) => format!("Claude ({model})"),
            None => "Claude".to_string(),
        }
    }

    async fn stream(&self, prompt: &str, sink: &mut dyn StreamSink) -> Result<(), ModelError> {
        check_claude_installed().await?;
        run_claude_streaming(prompt, self.model.as_deref(), sink).await?;
        Ok(())
    }
}
