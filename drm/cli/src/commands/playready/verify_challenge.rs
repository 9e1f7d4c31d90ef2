use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use data_encoding::BASE64;

use drm_playready::verify_challenge;

/**
    Check the digest and signature of a challenge document.
*/
#[derive(Args)]
pub struct VerifyChallengeCommand {
    /// Challenge XML file.
    path: PathBuf,
}

impl VerifyChallengeCommand {
    pub fn run(self) -> Result<()> {
        let document = std::fs::read_to_string(&self.path).context("failed to read challenge file")?;
        let summary = verify_challenge(&document).context("challenge verification failed")?;

        println!("Signature:   OK");
        println!("Version:     {}", summary.license_version);
        println!("Nonce:       {}", BASE64.encode(&summary.nonce));
        println!("Client Time: {}", summary.client_time);
        println!("Public Key:  {}", hex::encode(summary.public_key));

        Ok(())
    }
}
