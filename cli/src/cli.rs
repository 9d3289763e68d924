use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use riskband::Coordinate;

/// Look up which hazard probability band each address or point falls in
#[derive(Parser, Debug)]
#[command(name = "riskband", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve addresses and points against one or more layers (report on stdout)
    Evaluate(EvaluateArgs),

    /// List the layer datasets present in the archive
    Layers(LayersArgs),
}

/// Where the archive comes from and how to fetch it.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// JSON config file; flags below override its values
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Remote archive URL
    #[arg(long, value_hint = ValueHint::Url)]
    pub url: Option<String>,

    /// Local .zip archive instead of a remote one
    #[arg(long, conflicts_with = "url", value_hint = ValueHint::FilePath)]
    pub archive: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum OutputFormat { Table, Json }

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Layer tag to evaluate, matched against dataset file names (repeatable), e.g. 34knt
    #[arg(short, long = "layer", required = true)]
    pub layers: Vec<String>,

    /// File with one address per line ("-" reads stdin)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub addresses: Option<PathBuf>,

    /// Coordinate to evaluate as LAT,LON (repeatable)
    #[arg(short, long = "point", allow_hyphen_values = true)]
    pub points: Vec<Coordinate>,

    /// Attribute column holding the band value
    #[arg(long)]
    pub field: Option<String>,

    /// Maximum number of queries per run
    #[arg(long)]
    pub max_batch: Option<usize>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct LayersArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}
