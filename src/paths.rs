// ABOUTME: XDG Base Directory paths for config and data storage
// ABOUTME: Provides standardized locations for the stores, daemon logs, and the LaunchAgent plist

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Application identifier for XDG directories
const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "2389";
const APPLICATION: &str = "claude-slack-bridge";

/// launchd label for the background daemon
pub const LAUNCH_AGENT_LABEL: &str = "com.2389.claude-slack-bridge";

/// Get XDG-compliant directories for the application
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the data directory holding the persisted stores and daemon logs.
/// Honors the CLAUDE_CODE_SLACK_DATA_DIR override, then the XDG data dir,
/// falling back to ./data if XDG directories are unavailable.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CLAUDE_CODE_SLACK_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    project_dirs()
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Backing file for the thread -> session id map
pub fn sessions_file() -> PathBuf {
    data_dir().join("sessions.json")
}

/// Backing file for the channel -> model alias map
pub fn models_file() -> PathBuf {
    data_dir().join("models.json")
}

/// Daemon stdout log (launchd StandardOutPath)
pub fn log_file() -> PathBuf {
    data_dir().join("daemon.log")
}

/// Daemon stderr log (launchd StandardErrorPath)
pub fn err_log_file() -> PathBuf {
    data_dir().join("daemon.err.log")
}

/// Get the config directory path (e.g., ~/.config/claude-slack-bridge/)
/// Falls back to current directory if XDG directories unavailable
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the default config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Path of the launchd plist under ~/Library/LaunchAgents
pub fn launch_agent_plist() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Library")
        .join("LaunchAgents")
        .join(format!("{}.plist", LAUNCH_AGENT_LABEL))
}
