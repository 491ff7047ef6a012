// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Slack tokens are validated lazily so daemon and simulate subcommands work without them

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub claude: ClaudeConfig,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot OAuth token (xoxb-...) for Web API calls
    #[serde(default)]
    pub bot_token: String,
    /// App-level token (xapp-...) for Socket Mode connections
    #[serde(default)]
    pub app_token: String,
}

// Custom Debug impl to redact bot_token and app_token
impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("app_token", &"[REDACTED]")
            .finish()
    }
}

impl SlackConfig {
    /// Validate that both Slack tokens are present.
    ///
    /// Called on the `run` path only; daemon and simulate subcommands
    /// work without Slack credentials.
    pub fn ensure_tokens(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!(
                "slack.bot_token is required (set in config.toml or SLACK_BOT_TOKEN env var)"
            );
        }
        if self.app_token.trim().is_empty() {
            anyhow::bail!(
                "slack.app_token is required (set in config.toml or SLACK_APP_TOKEN env var)"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    #[serde(default = "default_claude_binary")]
    pub binary_path: String,
    /// Directory the claude CLI runs in; must exist when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default = "default_claude_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            binary_path: default_claude_binary(),
            working_dir: None,
            timeout_secs: default_claude_timeout(),
        }
    }
}

impl ClaudeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_claude_binary() -> String {
    "claude".to_string()
}

fn default_claude_timeout() -> u64 {
    300
}

impl Config {
    /// Load configuration from config.toml (XDG config dir, then the
    /// current directory) with environment variable overrides
    pub fn load() -> Result<Self> {
        let candidates = [paths::config_file(), PathBuf::from("config.toml")];

        let mut config = Config::default();
        for path in &candidates {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                config = Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                break;
            }
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse a configuration from TOML text; missing sections take defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("SLACK_BOT_TOKEN") {
            self.slack.bot_token = val;
        }
        if let Ok(val) = std::env::var("SLACK_APP_TOKEN") {
            self.slack.app_token = val;
        }
        if let Ok(val) = std::env::var("CLAUDE_BINARY_PATH") {
            self.claude.binary_path = val;
        }
        if let Ok(val) = std::env::var("CLAUDE_WORKING_DIR") {
            self.claude.working_dir = Some(val);
        }
        if let Ok(val) = std::env::var("CLAUDE_TIMEOUT") {
            self.claude.timeout_secs = val.parse().with_context(|| {
                format!("CLAUDE_TIMEOUT must be a number of seconds, got: {}", val)
            })?;
        }
        Ok(())
    }
}
