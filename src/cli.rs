// ABOUTME: clap command tree for the bridge binary
// ABOUTME: run starts the Slack listener; daemon and simulate work without Slack credentials

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "claude-slack-bridge",
    version,
    about = "Bridge Slack messages to the Claude Code CLI"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the Slack Socket Mode listener (foreground)
    Run,
    /// Manage the LaunchAgent daemon
    Daemon {
        #[arg(value_enum)]
        action: DaemonAction,
    },
    /// Exercise the claude invoker and session store without Slack
    Simulate {
        #[command(subcommand)]
        command: SimulateCommands,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DaemonAction {
    Install,
    Uninstall,
    Restart,
    Status,
    Log,
}

#[derive(Subcommand, Debug)]
pub enum SimulateCommands {
    /// Send a new top-level message
    Message {
        /// Message text
        text: String,
    },
    /// Reply in an existing simulated thread
    Reply {
        /// Thread key printed by a previous `simulate message`
        thread_ts: String,
        /// Reply text
        text: String,
    },
}
