//! NEMETEX command-line entry point
//!
//! Loads and validates the inputs, writes the run-level reports, then
//! processes each requested compound in order. Validation failures on the
//! mandatory exchange table abort the run; everything else degrades with a
//! console notice.

use anyhow::{Context, Result};
use clap::Parser;
use nemetex::aggregate::ExchangeAggregates;
use nemetex::loader::{load_abundance, load_exchanges, load_taxonomy};
use nemetex::model::{CompoundTable, ModelKind};
use nemetex::pipeline::RunContext;
use nemetex::report::ReportWriter;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "nemetex",
    version,
    about = "NEMETEX: compound-centered metabolic exchange networks for microbial communities"
)]
struct Cli {
    /// Model used to generate input files. Either CarveMe or gapseq are accepted
    #[arg(short, long, value_enum, default_value = "CarveMe")]
    model: ModelKind,

    /// File path for the smetana output file
    #[arg(short, long)]
    smetana: PathBuf,

    /// File path for MAGs abundances
    #[arg(short = 'a', long)]
    coverage: Option<PathBuf>,

    /// File path for MAGs taxonomy
    #[arg(short = 't', long)]
    taxonomy: Option<PathBuf>,

    /// Compound name OR file path for a list of several compound names
    #[arg(short = 'C', long)]
    compound: String,

    /// Prefix for the output folder
    #[arg(short, long, default_value = "")]
    prefix: String,
}

/// A `--compound` argument naming an existing file is a newline-delimited
/// list of compounds; anything else is a single compound.
fn requested_compounds(argument: &str) -> Vec<String> {
    match fs::read_to_string(Path::new(argument)) {
        Ok(content) => content
            .lines()
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
        Err(_) => vec![argument.to_string()],
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    let writer = ReportWriter::create(&cwd, &cli.prefix);

    let compound_table = CompoundTable::bundled(cli.model)?;

    // Mandatory input: validation errors here abort the whole run.
    let exchanges = load_exchanges(&cli.smetana)?;
    let aggregates = ExchangeAggregates::compute(&exchanges)?;

    let abundance = load_abundance(cli.coverage.as_deref());
    let taxonomy = load_taxonomy(cli.taxonomy.as_deref());

    let ctx = RunContext {
        model: cli.model,
        exchanges,
        aggregates,
        compound_table,
        abundance,
        taxonomy,
        writer,
    };

    ctx.write_run_reports();

    for compound in requested_compounds(&cli.compound) {
        // Skips and per-artifact failures are reported inside; a hard error
        // on one compound must not halt the rest of the batch.
        if let Err(err) = ctx.process_compound(&compound) {
            println!("\n<ERROR>: Processing of {compound} failed: {err:#}");
        }
    }

    Ok(())
}
