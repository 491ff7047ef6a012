// ABOUTME: Subprocess wrapper for the Claude Code CLI with timeout and output-size handling
// ABOUTME: All expected failure modes surface as ClaudeResult values, never as errors

use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::ClaudeConfig;
use crate::store::ModelAlias;

/// Hard limit for a single Slack message, in characters
pub const SLACK_MESSAGE_LIMIT: usize = 4000;

/// Appended to replies cut at the size limit
const TRUNCATION_MARKER: &str = "\n\n... (truncated, response too long)";

/// Characters reserved for the truncation marker
const TRUNCATION_RESERVE: usize = 50;

/// Environment variable the claude CLI sets in sessions it supervises.
/// Left in place, a nested invocation refuses to run.
const NESTED_SESSION_MARKER: &str = "CLAUDECODE";

/// Outcome of one claude CLI invocation.
///
/// Timeouts, a missing binary, and non-zero exits all come back as values
/// with `is_error` set; the caller relays `text` to the user either way.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaudeResult {
    pub text: String,
    pub session_id: Option<String>,
    pub is_error: bool,
}

impl ClaudeResult {
    fn error(text: impl Into<String>, session_id: Option<&str>) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.map(String::from),
            is_error: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    result: String,
    #[serde(default)]
    session_id: Option<String>,
}

/// Build the claude CLI argument list for one prompt.
/// `-r <session_id>` is included iff a non-empty session id is given.
pub fn build_args(prompt: &str, session_id: Option<&str>, model: Option<ModelAlias>) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        "--dangerously-skip-permissions".to_string(),
        "--output-format".to_string(),
        "json".to_string(),
    ];
    if let Some(model) = model {
        args.push("--model".to_string());
        args.push(model.as_str().to_string());
    }
    if let Some(session_id) = session_id.filter(|s| !s.is_empty()) {
        args.push("-r".to_string());
        args.push(session_id.to_string());
    }
    args.push(prompt.to_string());
    args
}

/// Run the claude CLI once and classify the outcome.
///
/// The child inherits the caller's environment minus the nested-session
/// marker, runs in the configured working directory, and is killed if it
/// outlives the timeout. Partial output from a timed-out run is discarded.
pub async fn invoke(
    config: &ClaudeConfig,
    prompt: &str,
    session_id: Option<&str>,
    model: Option<ModelAlias>,
    timeout: Duration,
) -> ClaudeResult {
    let args = build_args(prompt, session_id, model);

    let mut command = Command::new(&config.binary_path);
    command
        .args(&args)
        .env_remove(NESTED_SESSION_MARKER)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    if let Some(dir) = &config.working_dir {
        if !std::path::Path::new(dir).exists() {
            return ClaudeResult::error(
                format!("Claude working directory does not exist: {}", dir),
                session_id,
            );
        }
        command.current_dir(dir);
    }

    tracing::debug!(
        binary = %config.binary_path,
        resumed = session_id.is_some(),
        "Spawning claude CLI"
    );

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "claude CLI timed out");
            return ClaudeResult::error(
                "Claude timed out. Try a simpler prompt or increase CLAUDE_TIMEOUT.",
                session_id,
            );
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return ClaudeResult::error(
                "claude CLI not found. Ensure it is installed and on PATH.",
                None,
            );
        }
        Ok(Err(e)) => {
            return ClaudeResult::error(format!("Failed to spawn claude CLI: {}", e), session_id);
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let text = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            match output.status.code() {
                Some(code) => format!("claude exited with code {}", code),
                None => "claude terminated by signal".to_string(),
            }
        };
        tracing::warn!(exit_code = ?output.status.code(), "claude CLI failed");
        return ClaudeResult::error(text, session_id);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_output(&stdout, session_id)
}

/// Parse claude CLI stdout, falling back to the raw text when it is not
/// the expected JSON payload. A missing or empty session_id keeps the
/// caller's session id, so an unparseable reply never breaks continuity.
pub fn parse_output(stdout: &str, fallback_session_id: Option<&str>) -> ClaudeResult {
    match serde_json::from_str::<ClaudeResponse>(stdout) {
        Ok(response) => {
            let session_id = response
                .session_id
                .filter(|s| !s.is_empty())
                .or_else(|| fallback_session_id.map(String::from));
            ClaudeResult {
                text: clamp_reply(&response.result),
                session_id,
                is_error: false,
            }
        }
        Err(_) => ClaudeResult {
            text: clamp_reply(stdout.trim()),
            session_id: fallback_session_id.map(String::from),
            is_error: false,
        },
    }
}

/// Enforce the Slack size limit and the never-empty rule on a reply body
fn clamp_reply(text: &str) -> String {
    let text = if text.chars().count() > SLACK_MESSAGE_LIMIT {
        let head: String = text
            .chars()
            .take(SLACK_MESSAGE_LIMIT - TRUNCATION_RESERVE)
            .collect();
        format!("{}{}", head, TRUNCATION_MARKER)
    } else {
        text.to_string()
    };
    if text.is_empty() {
        "(empty response)".to_string()
    } else {
        text
    }
}
