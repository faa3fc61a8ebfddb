mod cli;
mod render;
mod settings;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    cli::dispatch(args)
}
