// ABOUTME: Tests for configuration parsing, defaults, and environment overrides
// ABOUTME: Env-mutating tests are serialized to avoid cross-test interference

use claude_slack_bridge::config::Config;
use claude_slack_bridge::paths;
use serial_test::serial;

#[test]
fn test_empty_config_takes_defaults() {
    let config = Config::from_toml("").unwrap();

    assert_eq!(config.claude.binary_path, "claude");
    assert_eq!(config.claude.timeout_secs, 300);
    assert!(config.claude.working_dir.is_none());
    assert!(config.slack.bot_token.is_empty());
}

#[test]
fn test_parses_full_config() {
    let toml = r#"
[slack]
bot_token = "xoxb-test"
app_token = "xapp-test"

[claude]
binary_path = "/usr/local/bin/claude"
working_dir = "/tmp"
timeout_secs = 60
"#;
    let config = Config::from_toml(toml).unwrap();

    assert_eq!(config.slack.bot_token, "xoxb-test");
    assert_eq!(config.slack.app_token, "xapp-test");
    assert_eq!(config.claude.binary_path, "/usr/local/bin/claude");
    assert_eq!(config.claude.working_dir.as_deref(), Some("/tmp"));
    assert_eq!(config.claude.timeout().as_secs(), 60);
    assert!(config.slack.ensure_tokens().is_ok());
}

#[test]
fn test_missing_tokens_fail_validation() {
    let config = Config::from_toml("").unwrap();
    let err = config.slack.ensure_tokens().unwrap_err().to_string();
    assert!(err.contains("SLACK_BOT_TOKEN"));

    let config = Config::from_toml("[slack]\nbot_token = \"xoxb-test\"\n").unwrap();
    let err = config.slack.ensure_tokens().unwrap_err().to_string();
    assert!(err.contains("SLACK_APP_TOKEN"));
}

#[test]
fn test_debug_redacts_tokens() {
    let config = Config::from_toml(
        "[slack]\nbot_token = \"xoxb-secret\"\napp_token = \"xapp-secret\"\n",
    )
    .unwrap();

    let dump = format!("{:?}", config.slack);

    assert!(!dump.contains("xoxb-secret"));
    assert!(!dump.contains("xapp-secret"));
    assert!(dump.contains("REDACTED"));
}

#[test]
fn test_malformed_toml_is_an_error() {
    assert!(Config::from_toml("[slack\nbot_token = ").is_err());
}

#[test]
#[serial]
fn test_env_overrides_win() {
    std::env::set_var("SLACK_BOT_TOKEN", "xoxb-env");
    std::env::set_var("SLACK_APP_TOKEN", "xapp-env");
    std::env::set_var("CLAUDE_BINARY_PATH", "/opt/claude");
    std::env::set_var("CLAUDE_TIMEOUT", "42");

    let result = Config::load();

    std::env::remove_var("SLACK_BOT_TOKEN");
    std::env::remove_var("SLACK_APP_TOKEN");
    std::env::remove_var("CLAUDE_BINARY_PATH");
    std::env::remove_var("CLAUDE_TIMEOUT");

    let config = result.unwrap();
    assert_eq!(config.slack.bot_token, "xoxb-env");
    assert_eq!(config.slack.app_token, "xapp-env");
    assert_eq!(config.claude.binary_path, "/opt/claude");
    assert_eq!(config.claude.timeout_secs, 42);
}

#[test]
#[serial]
fn test_invalid_timeout_env_is_an_error() {
    std::env::set_var("CLAUDE_TIMEOUT", "soon");

    let result = Config::load();

    std::env::remove_var("CLAUDE_TIMEOUT");
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_data_dir_env_override() {
    std::env::set_var("CLAUDE_CODE_SLACK_DATA_DIR", "/tmp/bridge-data");

    let data_dir = paths::data_dir();
    let sessions = paths::sessions_file();

    std::env::remove_var("CLAUDE_CODE_SLACK_DATA_DIR");

    assert_eq!(data_dir, std::path::PathBuf::from("/tmp/bridge-data"));
    assert_eq!(
        sessions,
        std::path::PathBuf::from("/tmp/bridge-data/sessions.json")
    );
}

#[test]
#[serial]
fn test_data_dir_default_is_not_empty() {
    std::env::remove_var("CLAUDE_CODE_SLACK_DATA_DIR");

    let data_dir = paths::data_dir();

    assert!(!data_dir.as_os_str().is_empty());
    assert!(paths::models_file().ends_with("models.json"));
}
