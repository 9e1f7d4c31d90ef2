use anyhow::{Context, Result};
use clap::Args;

use drm_playready::format::build_wrm_header;

/**
    Print a version 4.0.0.0 WRM header document for a key ID.
*/
#[derive(Args)]
pub struct BuildHeaderCommand {
    /// Base64-encoded 16-byte key ID.
    #[arg(short, long)]
    kid: String,
}

impl BuildHeaderCommand {
    pub fn run(self) -> Result<()> {
        let header = build_wrm_header(&self.kid).context("failed to build WRM header")?;
        println!("{header}");
        Ok(())
    }
}
