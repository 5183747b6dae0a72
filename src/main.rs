mod cli;
mod config;
mod error;
mod genotype;
mod model;
mod normalize;
mod output;
mod pipeline;
mod reader;

use crate::error::Result;
use clap::Parser;
use miette::IntoDiagnostic;
use std::path::PathBuf;

/// Normalize VCF alleles and tabulate per-allele sample statistics.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Input VCF ("-" reads stdin).
    #[arg(short, long, default_value = "-", value_hint = clap::ValueHint::FilePath)]
    input: String,

    /// Output TSV ("-" writes stdout).
    #[arg(short, long, default_value = "-", value_hint = clap::ValueHint::FilePath)]
    output: String,

    /// Write sample names, one per line, to this file.
    #[arg(long)]
    sample_list: Option<PathBuf>,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Logging verbosity (e.g. error, warn, info, debug).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Placeholder for empty sample lists.
    #[arg(long, default_value = "!")]
    empty_field: String,

    /// Separator between sample names within a column.
    #[arg(long, default_value = ";")]
    field_delimiter: String,

    /// Append the VCF ID column.
    #[arg(long)]
    keep_id: bool,

    /// Append the VCF QUAL column.
    #[arg(long)]
    keep_qual: bool,

    /// Append the original VCF POS column.
    #[arg(long)]
    keep_pos: bool,

    /// Append the ALT allele index and the VCF INFO column.
    #[arg(long)]
    keep_info: bool,

    /// Comma-separated FILTER values to keep. Empty keeps everything.
    #[arg(long, default_value = "PASS,.")]
    allow_filter: String,

    /// Comma-separated FILTER values to drop.
    #[arg(long)]
    exclude_filter: Option<String>,

    /// Number of worker threads (default: available parallelism).
    #[arg(short, long)]
    threads: Option<usize>,

    /// Data lines per unit of work.
    #[arg(long, default_value_t = pipeline::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Write a JSON run report to this file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide the progress spinner.
    #[arg(short, long)]
    quiet: bool,
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(&args)?;
    cli::run(&args)
}

fn main() -> miette::Result<()> {
    try_main().into_diagnostic()
}
