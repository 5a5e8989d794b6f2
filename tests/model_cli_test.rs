//! Integration tests for streaming from the Claude and Codex CLIs.
//!
//! Fake `claude` and `codex` shell scripts placed first on `PATH` emulate the
//! CLIs' output and failure modes, so the real subprocess, parsing, retry and
//! fallback code paths run end to end.

#![cfg(unix)]

use std::fs;
use std::future::Future;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use chlog::claude::ClaudeClient;
use chlog::codex::CodexClient;
use chlog::llm::{FallbackClient, RetryingClient};
use chlog::{ClaudeError, ModelClient, ModelError, OutputBuffer};

/// Create a directory holding an executable `claude` script.
fn fake_claude(body: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp directory");
    install_script(dir.path(), "claude", body);
    dir
}

/// Write an executable script `name` into `dir` that answers `--version`.
fn install_script(dir: &Path, name: &str, body: &str) {
    let script_path = dir.join(name);

    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo \"0.0.0 (fake)\"; exit 0; fi\n{}",
        body
    );
    fs::write(&script_path, script).expect("Failed to write mock script");

    let mut perms = fs::metadata(&script_path)
        .expect("Failed to get metadata")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script_path, perms).expect("Failed to set permissions");
}

/// Run `fut` with the fake CLIs first on `PATH`.
fn with_fake_claude<T>(dir: &Path, timeout: Option<&str>, fut: impl Future<Output = T>) -> T {
    let path = format!(
        "{}:{}",
        dir.display(),
        std::env::var("PATH").unwrap_or_default()
    );
    temp_env::with_vars(
        [
            ("PATH", Some(path.as_str())),
            ("CHLOG_CLAUDE_TIMEOUT", timeout),
        ],
        || {
            tokio::runtime::Runtime::new()
                .expect("Failed to build runtime")
                .block_on(fut)
        },
    )
}

const MOCK_STREAM: &str = r#"
echo "$@" > "$(dirname "$0")/args"
printf '%s\n' '{"type":"system","subtype":"init"}'
echo 'not json at all'
printf '%s\n' '{"type":"assistant","message":{"content":[{"type":"text","text":"Add helper\n\n* a.el (foo): x "}]}}'
printf '%s\n' '{"type":"assistant","message":{"content":[{"type":"tool_use","id":"1"},{"type":"text","text":"(bar): y"}]}}'
printf '%s\n' '{"type":"result","subtype":"success","is_error":false,"result":"done"}'
"#;

#[test]
#[serial]
fn test_streams_assistant_text() {
    let dir = fake_claude(MOCK_STREAM);
    let client = ClaudeClient::new(Some("opus".to_string()));
    let mut output = OutputBuffer::new();

    with_fake_claude(dir.path(), None, client.stream("the prompt", &mut output)).unwrap();

    assert_eq!(output.as_str(), "Add helper\n\n* a.el (foo): x (bar): y");

    let args = fs::read_to_string(dir.path().join("args")).unwrap();
    assert!(args.starts_with("-p the prompt"), "args: {args}");
    assert!(args.contains("--output-format stream-json"), "args: {args}");
    assert!(args.contains("--model opus"), "args: {args}");
}

const MOCK_IS_ERROR: &str = r#"
printf '%s\n' '{"type":"result","subtype":"error","is_error":true,"result":"Claude encountered an internal error"}'
"#;

#[test]
#[serial]
fn test_error_result_fails_stream() {
    let dir = fake_claude(MOCK_IS_ERROR);
    let mut output = OutputBuffer::new();

    let result = with_fake_claude(
        dir.path(),
        None,
        ClaudeClient::default().stream("p", &mut output),
    );

    match result {
        Err(ModelError::Claude(ClaudeError::ExecutionFailed(message))) => {
            assert!(message.contains("internal error"));
        }
        other => panic!("Expected ExecutionFailed, got: {:?}", other),
    }
}

const MOCK_DETAILED_ERROR: &str = r#"
echo "Error: Authentication failed" >&2
echo "Hint: Run 'claude auth login' to authenticate" >&2
exit 42
"#;

#[test]
#[serial]
fn test_nonzero_exit_captures_stderr() {
    let dir = fake_claude(MOCK_DETAILED_ERROR);
    let mut output = OutputBuffer::new();

    let result = with_fake_claude(
        dir.path(),
        None,
        ClaudeClient::default().stream("p", &mut output),
    );

    match result {
        Err(ModelError::Claude(ClaudeError::NonZeroExit { code, stderr })) => {
            assert_eq!(code, 42);
            assert!(stderr.contains("Authentication failed"));
            assert!(stderr.contains("claude auth login"));
        }
        other => panic!("Expected NonZeroExit, got: {:?}", other),
    }
}

const MOCK_HANG: &str = "exec sleep 30\n";

#[test]
#[serial]
fn test_timeout_is_reported() {
    let dir = fake_claude(MOCK_HANG);
    let mut output = OutputBuffer::new();

    let result = with_fake_claude(
        dir.path(),
        Some("1"),
        ClaudeClient::default().stream("p", &mut output),
    );

    assert!(
        matches!(result, Err(ModelError::Claude(ClaudeError::Timeout(1)))),
        "got: {:?}",
        result
    );
}

/// Fails once after writing partial output, then succeeds.
const MOCK_FLAKY: &str = r#"
DIR="$(dirname "$0")"
COUNT=$(cat "$DIR/count" 2>/dev/null || echo 0)
COUNT=$((COUNT + 1))
echo "$COUNT" > "$DIR/count"
if [ "$COUNT" -lt 2 ]; then
  printf '%s\n' '{"type":"assistant","message":{"content":[{"type":"text","text":"partial"}]}}'
  echo "Error: overloaded" >&2
  exit 1
fi
printf '%s\n' '{"type":"assistant","message":{"content":[{"type":"text","text":"complete"}]}}'
"#;

#[test]
#[serial]
fn test_retry_discards_failed_attempt_output() {
    let dir = fake_claude(MOCK_FLAKY);
    let client = RetryingClient::new(ClaudeClient::default())
        .with_intervals(Duration::from_millis(10), Duration::from_millis(50));
    let mut output = OutputBuffer::new();

    with_fake_claude(dir.path(), None, client.stream("p", &mut output)).unwrap();

    assert_eq!(output.as_str(), "complete");
    assert_eq!(fs::read_to_string(dir.path().join("count")).unwrap().trim(), "2");
}

#[test]
#[serial]
fn test_retries_exhausted_keeps_last_error() {
    let dir = fake_claude(MOCK_DETAILED_ERROR);
    let client = RetryingClient::new(ClaudeClient::default())
        .with_intervals(Duration::from_millis(10), Duration::from_millis(50));
    let mut output = OutputBuffer::new();

    let result = with_fake_claude(dir.path(), None, client.stream("p", &mut output));

    match result {
        Err(ModelError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(
                *last,
                ModelError::Claude(ClaudeError::NonZeroExit { code: 42, .. })
            ));
        }
        other => panic!("Expected RetriesExhausted, got: {:?}", other),
    }
}

#[test]
#[serial]
fn test_codex_streams_stdout_lines() {
    let dir = TempDir::new().unwrap();
    install_script(
        dir.path(),
        "codex",
        "echo \"$@\" > \"$(dirname \"$0\")/args\"\necho 'Fix parser'\necho ''\necho '* parse.c (parse_line): Skip blanks.'\n",
    );
    let mut output = OutputBuffer::new();

    with_fake_claude(
        dir.path(),
        None,
        CodexClient::new(Some("o3".to_string())).stream("the prompt", &mut output),
    )
    .unwrap();

    assert_eq!(output.as_str(), "Fix parser\n\n* parse.c (parse_line): Skip blanks.\n");
    let args = fs::read_to_string(dir.path().join("args")).unwrap();
    assert_eq!(args.trim(), "exec --model o3 the prompt");
}

#[test]
#[serial]
fn test_fallback_to_codex_replaces_failed_output() {
    let dir = fake_claude(
        "printf '%s\\n' '{\"type\":\"assistant\",\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"claude partial\"}]}}'\nexit 3\n",
    );
    install_script(dir.path(), "codex", "echo 'from codex'\n");
    let client = FallbackClient::new(
        Arc::new(ClaudeClient::default()),
        Arc::new(CodexClient::default()),
    );
    let mut output = OutputBuffer::new();

    with_fake_claude(dir.path(), None, client.stream("p", &mut output)).unwrap();

    assert_eq!(output.as_str(), "from codex\n");
}
