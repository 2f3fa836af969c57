//! # Screwcalc GUI Application
//!
//! Dialog-driven desktop front end. Pick an input table, pick where the results
//! go, and get a message box with the outcome:
//!
//! 1. File-open dialog for the input workbook or CSV
//! 2. Schema check and row evaluation (aborts on the first bad row)
//! 3. File-save dialog for the output (`.xlsx` by default, `.csv`, or `.json`
//!    for a report)
//! 4. Success message, or the error message verbatim
//!
//! Cancelling either dialog ends the program without a message.

use std::path::{Path, PathBuf};

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use tracing_subscriber::EnvFilter;

use screw_core::batch::process_table;
use screw_core::errors::CalcResult;
use screw_core::file_io::{read_table, save_results, SaveOptions};
use screw_core::settings::BatchSettings;

const SAVE_TITLE: &str = "Save Power Screw Results";

const SUCCESS_MESSAGE: &str = "All power screw parameters calculated and saved successfully.";

const INPUT_PROMPT: &str = "Select Excel file with columns: Pitch, Threads, NominalDiameter, \
CoreDiameter, FrictionAngle, Load";

const EXCEL_FILTER: (&str, &[&str]) = ("Excel Files", &["xlsx", "xlsm", "xls", "ods"]);

const CSV_FILTER: (&str, &[&str]) = ("CSV Files", &["csv"]);

/// How a run ended when nothing went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Saved(PathBuf),
    Cancelled,
}

fn main() {
    init_tracing();

    match run() {
        Ok(Outcome::Saved(path)) => {
            tracing::info!(path = %path.display(), "results saved");
            show_message(MessageLevel::Info, "Success", SUCCESS_MESSAGE);
        }
        Ok(Outcome::Cancelled) => tracing::info!("cancelled by user"),
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            show_message(MessageLevel::Error, "Error", &e.to_string());
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run() -> CalcResult<Outcome> {
    let Some(input) = FileDialog::new()
        .set_title(INPUT_PROMPT)
        .add_filter(EXCEL_FILTER.0, EXCEL_FILTER.1)
        .add_filter(CSV_FILTER.0, CSV_FILTER.1)
        .pick_file()
    else {
        return Ok(Outcome::Cancelled);
    };

    let table = read_table(&input, b',')?;
    let processed = process_table(&table, &BatchSettings::default())?;

    let Some(chosen) = FileDialog::new()
        .set_title(SAVE_TITLE)
        .add_filter(EXCEL_FILTER.0, &["xlsx"])
        .add_filter(CSV_FILTER.0, CSV_FILTER.1)
        .add_filter("JSON Report", &["json"])
        .set_file_name(default_output_name(&input))
        .save_file()
    else {
        return Ok(Outcome::Cancelled);
    };

    let output = with_default_extension(chosen);
    let options = SaveOptions::for_path(&output).with_source(input.display().to_string());
    save_results(&processed, &output, &options)?;

    Ok(Outcome::Saved(output))
}

fn show_message(level: MessageLevel, title: &str, description: &str) {
    let _ = MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Suggested output name: `<input stem>_results.xlsx`
fn default_output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "power_screw".to_string());
    format!("{}_results.xlsx", stem)
}

/// Add `.xlsx` when the save dialog returns a name without an extension
fn with_default_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("xlsx")
    }
}
