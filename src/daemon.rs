// ABOUTME: macOS LaunchAgent management for running the bridge as a background daemon
// ABOUTME: Generates a launchd plist pointing at the current executable and drives launchctl

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::process::Command;

use crate::cli::DaemonAction;
use crate::paths;

pub async fn handle(action: DaemonAction) -> Result<()> {
    match action {
        DaemonAction::Install => install().await,
        DaemonAction::Uninstall => uninstall().await,
        DaemonAction::Restart => restart().await,
        DaemonAction::Status => status().await,
        DaemonAction::Log => log(),
    }
}

async fn install() -> Result<()> {
    let data_dir = paths::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let plist_path = paths::launch_agent_plist();
    if let Some(parent) = plist_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&plist_path, generate_plist()?)
        .with_context(|| format!("Failed to write {}", plist_path.display()))?;

    launchctl_checked(&["load", &plist_path.display().to_string()]).await?;

    println!("Installed and loaded {}", paths::LAUNCH_AGENT_LABEL);
    println!("Plist: {}", plist_path.display());
    println!("Logs:  {}", paths::log_file().display());
    Ok(())
}

async fn uninstall() -> Result<()> {
    let plist_path = paths::launch_agent_plist();
    if plist_path.exists() {
        // Unload may fail if the agent was never loaded; removal still proceeds
        let _ = launchctl(&["unload", &plist_path.display().to_string()]).await;
        std::fs::remove_file(&plist_path)
            .with_context(|| format!("Failed to remove {}", plist_path.display()))?;
        println!("Unloaded and removed {}", paths::LAUNCH_AGENT_LABEL);
    } else {
        println!("LaunchAgent not installed");
    }
    Ok(())
}

async fn restart() -> Result<()> {
    let plist_path = paths::launch_agent_plist();
    if !plist_path.exists() {
        anyhow::bail!("LaunchAgent not installed. Run 'daemon install' first.");
    }
    let plist_str = plist_path.display().to_string();
    let _ = launchctl(&["unload", &plist_str]).await;
    launchctl_checked(&["load", &plist_str]).await?;
    println!("Restarted {}", paths::LAUNCH_AGENT_LABEL);
    Ok(())
}

async fn status() -> Result<()> {
    let output = launchctl(&["list"]).await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout
        .lines()
        .find(|line| line.contains(paths::LAUNCH_AGENT_LABEL))
    {
        Some(line) => println!("Running: {}", line),
        None => println!("Not running"),
    }
    Ok(())
}

fn log() -> Result<()> {
    let log_file = paths::log_file();
    println!("Stdout: {}", log_file.display());
    println!("Stderr: {}", paths::err_log_file().display());

    if log_file.exists() {
        let content = std::fs::read_to_string(&log_file)
            .with_context(|| format!("Failed to read {}", log_file.display()))?;
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(20);
        println!("\n--- Last 20 lines of daemon.log ---");
        for line in &lines[start..] {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn launchctl(args: &[&str]) -> Result<std::process::Output> {
    Command::new("launchctl")
        .args(args)
        .output()
        .await
        .context("Failed to run launchctl — LaunchAgent management requires macOS")
}

async fn launchctl_checked(args: &[&str]) -> Result<()> {
    let output = launchctl(args).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("launchctl {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok(())
}

/// Render the launchd plist running `<current_exe> run` under the agent label
fn generate_plist() -> Result<String> {
    let exe = std::env::current_exe().context("Failed to resolve current executable")?;
    let home = directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/"));

    // launchd agents get a minimal PATH; include the usual claude install locations
    let path_value = [
        home.join(".local/bin").display().to_string(),
        home.join(".cargo/bin").display().to_string(),
        "/opt/homebrew/bin".to_string(),
        "/usr/local/bin".to_string(),
        "/usr/bin".to_string(),
        "/bin".to_string(),
    ]
    .join(":");

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{exe}</string>
        <string>run</string>
    </array>
    <key>KeepAlive</key>
    <true/>
    <key>RunAtLoad</key>
    <true/>
    <key>EnvironmentVariables</key>
    <dict>
        <key>PATH</key>
        <string>{path}</string>
    </dict>
    <key>StandardOutPath</key>
    <string>{out}</string>
    <key>StandardErrorPath</key>
    <string>{err}</string>
</dict>
</plist>
"#,
        label = xml_escape(paths::LAUNCH_AGENT_LABEL),
        exe = xml_escape(&exe.display().to_string()),
        path = xml_escape(&path_value),
        out = xml_escape(&paths::log_file().display().to_string()),
        err = xml_escape(&paths::err_log_file().display().to_string()),
    ))
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plist_contains_label_and_run_command() {
        let plist = generate_plist().unwrap();
        assert!(plist.contains(paths::LAUNCH_AGENT_LABEL));
        assert!(plist.contains("<string>run</string>"));
        assert!(plist.contains("<key>KeepAlive</key>"));
        assert!(plist.contains("<key>StandardOutPath</key>"));
    }

    #[test]
    fn test_plist_points_at_current_executable() {
        let plist = generate_plist().unwrap();
        let exe = std::env::current_exe().unwrap();
        assert!(plist.contains(&xml_escape(&exe.display().to_string())));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a&b<c>d"), "a&amp;b&lt;c&gt;d");
        assert_eq!(xml_escape("plain"), "plain");
    }
}
