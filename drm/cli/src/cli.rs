use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::PlayReadyCommand;

/**
    DRM command-line tool.
*/
#[derive(Parser)]
#[command(name = "drm-cli")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// PlayReady DRM commands.
    #[command(name = "playready")]
    PlayReady(PlayReadyCommand),
}

impl Cli {
    /**
        Install a stderr subscriber. Stdout is reserved for command output.
    */
    pub fn init_logging(&self) {
        let default_level = match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        // Ignore a second initialization (only possible in tests)
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    pub fn run(self) -> Result<()> {
        match self.command {
            Command::PlayReady(cmd) => cmd.run(),
        }
    }
}
