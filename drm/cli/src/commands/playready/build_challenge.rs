use std::path::PathBuf;

use anyhow::{Context, Result, bail, ensure};
use clap::Args;
use tracing::info;

use drm_playready::format::{WrmHeader, build_wrm_header};
use drm_playready::{EccKey, build_license_challenge};

/**
    Build a signed license acquisition challenge.

    The signing key is a 32-byte private scalar or the 96-byte private + public
    layout, given either as hex text or as a raw key file.
*/
#[derive(Args)]
pub struct BuildChallengeCommand {
    /// Device certificate chain file (raw BCert chain).
    #[arg(short, long)]
    chain: PathBuf,

    /// Signing key as hex (64 or 192 characters).
    #[arg(
        short,
        long,
        conflicts_with = "signing_key_file",
        required_unless_present = "signing_key_file"
    )]
    signing_key: Option<String>,

    /// Raw 32 or 96 byte signing key file.
    #[arg(long)]
    signing_key_file: Option<PathBuf>,

    /// WRM header XML file.
    #[arg(long, conflicts_with = "kid", required_unless_present = "kid")]
    header: Option<PathBuf>,

    /// Base64 key ID; a 4.0.0.0 WRM header is built for it.
    #[arg(short, long)]
    kid: Option<String>,

    /// Write the challenge here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl BuildChallengeCommand {
    pub fn run(self) -> Result<()> {
        let chain = std::fs::read(&self.chain).context("failed to read certificate chain file")?;
        ensure!(!chain.is_empty(), "certificate chain file is empty");
        eprintln!("Loaded certificate chain ({} bytes)", chain.len());

        let key_bytes = self.load_signing_key()?;
        let key = EccKey::from_bytes(&key_bytes).context("failed to load signing key")?;

        let header = self.load_header()?;
        eprintln!("WRM header version: {}", header.version());

        let challenge =
            build_license_challenge(&chain, &key, &header).context("failed to build challenge")?;
        info!(len = challenge.len(), "challenge built");

        match &self.output {
            Some(path) => {
                std::fs::write(path, &challenge).context("failed to write challenge")?;
                eprintln!("Wrote challenge ({} bytes) to {}", challenge.len(), path.display());
            }
            None => println!("{challenge}"),
        }

        Ok(())
    }

    fn load_header(&self) -> Result<WrmHeader> {
        let xml = match (&self.header, &self.kid) {
            (Some(path), _) => {
                std::fs::read_to_string(path).context("failed to read WRM header file")?
            }
            (None, Some(kid)) => build_wrm_header(kid).context("failed to build WRM header")?,
            (None, None) => bail!("either --header or --kid is required"),
        };
        WrmHeader::from_xml(&xml).context("failed to parse WRM header")
    }

    fn load_signing_key(&self) -> Result<Vec<u8>> {
        match (&self.signing_key, &self.signing_key_file) {
            (Some(text), _) => hex::decode(text.trim()).context("signing key is not valid hex"),
            (None, Some(path)) => std::fs::read(path)
                .with_context(|| format!("failed to read signing key file {}", path.display())),
            (None, None) => bail!("either --signing-key or --signing-key-file is required"),
        }
    }
}
