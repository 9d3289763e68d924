mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::{evaluate, layers};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match &cli.command {
        Commands::Evaluate(args) => evaluate::run(args),
        Commands::Layers(args) => layers::run(args),
    }
}
