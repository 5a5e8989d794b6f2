//! Codex CLI spawning.

use std::env;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{CodexError, ModelError};
use crate::llm::{ModelClient, StreamSink};

/// Default timeout for Codex subprocess execution (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "CHLOG_CODEX_TIMEOUT";

/// Get the configured timeout duration.
///
/// Reads from CHLOG_CODEX_TIMEOUT environment variable if set,
/// otherwise uses the default of 300 seconds.
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

/// Check if Codex CLI is installed and accessible.
pub async fn check_codex_installed() -> Result<(), CodexError> {
    if which::which("codex").is_err() {
        return Err(CodexError::NotInstalled);
    }

    let version_check = Command::new("codex")
        .arg("--version")
        .output()
        .await
        .map_err(CodexError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(CodexError::NotInstalled);
    }

    Ok(())
}

/// Run `codex exec [--model M] <prompt>`, streaming stdout into `sink`.
///
/// `codex exec` prints progress on stderr and the agent's answer on stdout,
/// so every stdout line is appended as it arrives.
pub async fn run_codex_streaming(
    prompt: &str,
    model: Option<&str>,
    sink: &mut dyn StreamSink,
) -> Result<(), CodexError> {
    let timeout_duration = get_timeout();
    let timeout_secs = timeout_duration.as_secs();

    let mut cmd = Command::new("codex");
    cmd.arg("exec");
    if let Some(model) = model {
        cmd.arg("--model").arg(model);
    }
    cmd.arg(prompt)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(CodexError::SpawnFailed)?;
    let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(CodexError::ReadFailed(std::io::Error::other(
            "child output was not captured",
        )));
    };

    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).to_string()
    });

    let streamed = timeout(timeout_duration, async {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await.map_err(CodexError::ReadFailed)? {
            sink.append(&line);
            sink.append("\n");
        }
        child.wait().await.map_err(CodexError::ReadFailed)
    })
    .await;

    let status = match streamed {
        Ok(result) => result?,
        Err(_) => {
            stderr_task.abort();
            return Err(CodexError::Timeout(timeout_secs));
        }
    };

    if !status.success() {
        let stderr = stderr_task.await.unwrap_or_default();
        let code = status.code().unwrap_or(-1);
        return Err(CodexError::NonZeroExit { code, stderr });
    }

    debug!("Codex stream completed");
    Ok(())
}

/// Model client backed by the Codex CLI.
#[derive(Debug, Clone, Default)]
pub struct CodexClient {
    model: Option<String>,
}

impl CodexClient {
    pub fn new(model: Option<String>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ModelClient for CodexClient {
    fn name(&self) -> String {
        match &self.model {
            Some(model) => format!("Codex ({model})"),
            None => "Codex".to_string(),
        }
    }

    async fn stream(&self, prompt: &str, sink: &mut dyn StreamSink) -> Result<(), ModelError> {
        check_codex_installed().await?;
        run_codex_streaming(prompt, self.model.as_deref(), sink).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_get_timeout_default() {
        temp_env::with_var_unset(TIMEOUT_ENV_VAR, || {
            let timeout = get_timeout();
            assert_eq!(timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }

    #[test]
    #[serial]
    fn test_get_timeout_from_env() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("60"), || {
            let timeout = get_timeout();
            assert_eq!(timeout, Duration::from_secs(60));
        });
    }

    #[test]
    #[serial]
    fn test_get_timeout_invalid_env_uses_default() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("-5"), || {
            let timeout = get_timeout();
            assert_eq!(timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }

    #[test]
    fn test_client_name_includes_model() {
        assert_eq!(CodexClient::default().name(), "Codex");
        assert_eq!(CodexClient::new(Some("o4-mini".to_string())).name(), "Codex (o4-mini)");
    }
}
