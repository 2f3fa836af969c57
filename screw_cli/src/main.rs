//! # Screwcalc CLI Application
//!
//! Batch front end for the power screw calculator: reads a CSV table or Excel
//! workbook, appends the computed columns, and writes CSV, xlsx or a JSON report.
//!
//! ```text
//! screw_cli screws.xlsx -o screws_out.xlsx
//! screw_cli screws.csv -o screws_out.csv
//! screw_cli screws.csv -o report.json --flag-errors
//! screw_cli screws.csv --rounding half-away --decimals 2 > out.csv
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use screw_core::batch::{process_table, ProcessedTable};
use screw_core::errors::CalcError;
use screw_core::file_io::{
    build_report, read_table, save_results, workbook_bytes, write_table_to, OutputFormat, SaveOptions,
};
use screw_core::settings::{load_settings, BatchSettings, ErrorPolicy, RoundingMode};

#[derive(Parser, Debug)]
#[command(name = "screw_cli")]
#[command(
    author,
    version,
    about = "Power screw torque, efficiency and stress calculator"
)]
struct Cli {
    /// Input CSV or workbook with columns Pitch, Threads, NominalDiameter, CoreDiameter, FrictionAngle, Load
    input: PathBuf,

    /// Output file (default: CSV to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: csv, xlsx or json (default: from the output extension, else csv)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Tie-break rule for rounding: half-even or half-away
    #[arg(long)]
    rounding: Option<RoundingMode>,

    /// Decimals every computed value is rounded to
    #[arg(long)]
    decimals: Option<u32>,

    /// Keep going past rows that cannot be computed and flag them in an Error column
    #[arg(long)]
    flag_errors: bool,

    /// JSON settings file; command-line options override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV field delimiter for input and output
    #[arg(short, long, default_value = ",")]
    delimiter: char,

    /// Also print errors as JSON on stderr
    #[arg(long)]
    json_errors: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if cli.json_errors {
                if let Some(calc_error) = e.downcast_ref::<CalcError>() {
                    if let Ok(json) = serde_json::to_string_pretty(calc_error) {
                        eprintln!();
                        eprintln!("Error JSON:");
                        eprintln!("{}", json);
                    }
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Settings file (if any) with command-line overrides applied
fn resolve_settings(cli: &Cli) -> Result<BatchSettings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)
            .with_context(|| format!("Failed to load settings from '{}'", path.display()))?,
        None => BatchSettings::default(),
    };

    if let Some(mode) = cli.rounding {
        settings.rounding.mode = mode;
    }
    if let Some(decimals) = cli.decimals {
        settings.rounding.decimals = decimals;
    }
    if cli.flag_errors {
        settings.error_policy = ErrorPolicy::Flag;
    }

    settings.validate()?;
    Ok(settings)
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got '{}'", delimiter);
    }
    Ok(delimiter as u8)
}

fn run(cli: &Cli) -> Result<()> {
    let settings = resolve_settings(cli)?;
    let delimiter = delimiter_byte(cli.delimiter)?;

    let table = read_table(&cli.input, delimiter)
        .with_context(|| format!("Failed to read '{}'", cli.input.display()))?;
    tracing::info!(rows = table.len(), input = %cli.input.display(), "loaded input table");

    let processed = process_table(&table, &settings)?;
    print_summary(&processed);

    let source = cli.input.display().to_string();
    match &cli.output {
        Some(path) => {
            let options = SaveOptions {
                format: cli.format.unwrap_or_else(|| OutputFormat::from_path(path)),
                delimiter,
                source: Some(source),
            };
            save_results(&processed, path, &options)
                .with_context(|| format!("Failed to save '{}'", path.display()))?;
            eprintln!("Saved results to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            write_output(&processed, cli.format.unwrap_or_default(), delimiter, &source, stdout.lock())?
        }
    }

    Ok(())
}

/// Write results to a stream (stdout when no output file is given)
fn write_output<W: Write>(
    processed: &ProcessedTable,
    format: OutputFormat,
    delimiter: u8,
    source: &str,
    mut out: W,
) -> Result<()> {
    match format {
        OutputFormat::Csv => write_table_to(&processed.to_table(), &mut out, delimiter)?,
        OutputFormat::Xlsx => out.write_all(&workbook_bytes(&processed.to_table())?)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &build_report(processed, Some(source)))?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn print_summary(processed: &ProcessedTable) {
    let batch = &processed.batch;
    eprintln!(
        "Computed {} of {} rows ({} flagged)",
        batch.computed_count(),
        batch.results.len(),
        batch.failed_count()
    );
    for row_error in &batch.errors {
        eprintln!("  [FLAG] row {}: {}", row_error.row, row_error.error);
    }
}
