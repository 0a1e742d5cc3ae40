//! # Community CLI
//!
//! Binary entry point for the `community` command-line tool.
//!
//! It parses arguments with `clap`, runs the selected command, and turns any
//! error into a message on stderr and a non-zero exit code. All reconciliation
//! logic lives in the `community_sync` library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
