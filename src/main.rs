// ABOUTME: Main entry point - initializes logging and config, dispatches CLI subcommands
// ABOUTME: run starts the Slack listener; simulate drives the invoker and store directly

use anyhow::Result;
use clap::Parser;
use claude_slack_bridge::cli::{Cli, Commands, SimulateCommands};
use claude_slack_bridge::store::SessionStore;
use claude_slack_bridge::{claude, config::Config, daemon, paths, slack};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Run => {
            tracing::info!(
                binary = %config.claude.binary_path,
                timeout_secs = config.claude.timeout_secs,
                data_dir = %paths::data_dir().display(),
                "Starting claude-slack-bridge"
            );
            slack::start(config).await
        }
        Commands::Daemon { action } => daemon::handle(action).await,
        Commands::Simulate { command } => simulate(command, config).await,
    }
}

/// Drive the invoker and session store from the terminal, no Slack involved.
/// Useful for checking the claude CLI setup before wiring up tokens.
async fn simulate(command: SimulateCommands, config: Config) -> Result<()> {
    let sessions = SessionStore::new(paths::sessions_file());

    match command {
        SimulateCommands::Message { text } => {
            let result =
                claude::invoke(&config.claude, &text, None, None, config.claude.timeout()).await;

            let thread_ts = format!("sim_{}", chrono::Utc::now().timestamp_millis());
            if let Some(session_id) = &result.session_id {
                sessions.set(&thread_ts, session_id)?;
            }

            println!("thread_ts: {}", thread_ts);
            println!(
                "session_id: {}",
                result.session_id.as_deref().unwrap_or("(none)")
            );
            println!("response:\n{}", result.text);
        }
        SimulateCommands::Reply { thread_ts, text } => {
            let Some(session_id) = sessions.get(&thread_ts) else {
                eprintln!("No session found for thread_ts={}", thread_ts);
                std::process::exit(1);
            };

            let result = claude::invoke(
                &config.claude,
                &text,
                Some(&session_id),
                None,
                config.claude.timeout(),
            )
            .await;

            if let Some(new_session_id) = &result.session_id {
                sessions.set(&thread_ts, new_session_id)?;
            }

            println!(
                "session_id: {}",
                result.session_id.as_deref().unwrap_or("(none)")
            );
            println!("response:\n{}", result.text);
        }
    }
    Ok(())
}
