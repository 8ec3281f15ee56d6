use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tribunal",
    version,
    about = "Batch evaluation of recorded multi-agent game transcripts via an LLM judge"
)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides this).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate every discovered game and write results plus aggregation reports
    Run(RunArgs),
    /// Rebuild the aggregation reports from previously written game results
    Aggregate(AggregateArgs),
    /// Check that settings, criteria, and the input directory are usable
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the settings file
    #[arg(short, long, default_value = "config/settings.yaml")]
    pub config: PathBuf,

    /// Override the input directory from the settings file
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Override the output directory from the settings file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct AggregateArgs {
    /// Path to the settings file
    #[arg(short, long, default_value = "config/settings.yaml")]
    pub config: PathBuf,

    /// Directory holding `*_result.json` files; defaults to the settings'
    /// output directory
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the settings file
    #[arg(short, long, default_value = "config/settings.yaml")]
    pub config: PathBuf,
}
