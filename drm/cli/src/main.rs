mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use self::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();
    cli.run()
}
