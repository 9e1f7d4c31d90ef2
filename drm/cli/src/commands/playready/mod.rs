use anyhow::Result;
use clap::{Args, Subcommand};

mod build_challenge;
mod build_header;
mod verify_challenge;

use self::build_challenge::BuildChallengeCommand;
use self::build_header::BuildHeaderCommand;
use self::verify_challenge::VerifyChallengeCommand;

/**
    PlayReady DRM commands.
*/
#[derive(Args)]
pub struct PlayReadyCommand {
    #[command(subcommand)]
    command: PlayReadySubcommand,
}

#[derive(Subcommand)]
enum PlayReadySubcommand {
    BuildHeader(BuildHeaderCommand),
    BuildChallenge(BuildChallengeCommand),
    VerifyChallenge(VerifyChallengeCommand),
}

impl PlayReadyCommand {
    pub fn run(self) -> Result<()> {
        match self.command {
            PlayReadySubcommand::BuildHeader(cmd) => cmd.run(),
            PlayReadySubcommand::BuildChallenge(cmd) => cmd.run(),
            PlayReadySubcommand::VerifyChallenge(cmd) => cmd.run(),
        }
    }
}
