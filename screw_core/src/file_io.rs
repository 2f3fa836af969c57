//! # File I/O Module
//!
//! Reads input tables and writes results with safety features:
//! - **Atomic saves**: Write to a unique temp file, sync, rename so a failed
//!   run never leaves a half-written output file behind
//! - **File locking**: A `.lock` file next to the output is held under an
//!   exclusive OS lock for the whole save, so two runs targeting the same file
//!   on a shared drive cannot interleave
//!
//! ## Formats
//!
//! - Excel workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) in, `.xlsx` out.
//!   The first worksheet is read; its first row is the header.
//! - CSV in, CSV out (delimiter configurable)
//! - JSON batch report out (see [`crate::report`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use screw_core::batch::process_table;
//! use screw_core::file_io::{read_table, save_results, SaveOptions};
//! use screw_core::settings::BatchSettings;
//! use std::path::Path;
//!
//! let table = read_table(Path::new("screws.xlsx"), b',')?;
//! let processed = process_table(&table, &BatchSettings::default())?;
//!
//! let output = Path::new("screws_out.xlsx");
//! save_results(&processed, output, &SaveOptions::for_path(output))?;
//! # Ok::<(), screw_core::errors::CalcError>(())
//! ```

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use calamine::{open_workbook_auto, Data, Range, Reader};
use fs2::FileExt;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};

use crate::batch::ProcessedTable;
use crate::errors::{CalcError, CalcResult};
use crate::report::BatchReport;
use crate::table::Table;

/// Extensions read as spreadsheets rather than CSV
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| candidates.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

/// Check if `path` names a spreadsheet workbook
pub fn is_workbook_path(path: &Path) -> bool {
    has_extension(path, &WORKBOOK_EXTENSIONS)
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Xlsx,
    Json,
}

impl OutputFormat {
    /// Pick a format from the file extension (`.xlsx` is Excel, `.json` is a
    /// JSON report, anything else CSV)
    pub fn from_path(path: &Path) -> Self {
        if has_extension(path, &["xlsx"]) {
            OutputFormat::Xlsx
        } else if has_extension(path, &["json"]) {
            OutputFormat::Json
        } else {
            OutputFormat::Csv
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => f.write_str("csv"),
            OutputFormat::Xlsx => f.write_str("xlsx"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unknown output format '{}' (expected csv, xlsx or json)",
                other
            )),
        }
    }
}

/// How results are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    pub format: OutputFormat,
    /// CSV field delimiter
    pub delimiter: u8,
    /// Input file name recorded in JSON reports
    pub source: Option<String>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            format: OutputFormat::Csv,
            delimiter: b',',
            source: None,
        }
    }
}

impl SaveOptions {
    /// Defaults with the format picked from the output extension
    pub fn for_path(path: &Path) -> Self {
        SaveOptions {
            format: OutputFormat::from_path(path),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Read an input table with a header row.
///
/// Workbooks are recognised by extension (see [`is_workbook_path`]);
/// everything else is read as CSV with `delimiter`. Header cells are trimmed;
/// data cells are kept as written. Rows may have fewer cells than the header.
pub fn read_table(path: &Path, delimiter: u8) -> CalcResult<Table> {
    if is_workbook_path(path) {
        return read_workbook(path);
    }

    let file = File::open(path)
        .map_err(|e| CalcError::file_error("open", path.display().to_string(), e.to_string()))?;

    let table = read_table_from(file, delimiter).map_err(|e| match e {
        CalcError::SerializationError { reason } => CalcError::file_error(
            "read",
            path.display().to_string(),
            reason,
        ),
        other => other,
    })?;

    tracing::debug!(path = %path.display(), rows = table.len(), "read input table");
    Ok(table)
}

/// Read CSV from any reader.
pub fn read_table_from<R: Read>(reader: R, delimiter: u8) -> CalcResult<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(headers);

    for record in csv_reader.records() {
        let record = record?;
        table.push_row(record.iter());
    }

    Ok(table)
}

/// Read the first worksheet of a workbook.
pub fn read_workbook(path: &Path) -> CalcResult<Table> {
    let path_display = path.display().to_string();

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| CalcError::file_error("open", path_display.clone(), e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| CalcError::file_error("read", path_display.clone(), e.to_string()))?,
        None => return Err(CalcError::file_error("read", path_display, "workbook has no worksheets")),
    };

    let table = table_from_range(&range);
    tracing::debug!(path = %path.display(), rows = table.len(), "read input workbook");
    Ok(table)
}

fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|cell| cell_text(cell).trim().to_string()).collect())
        .unwrap_or_default();

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(cell_text));
    }
    table
}

/// Cell contents as text; numbers use their shortest round-trip form
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        other => other.to_string(),
    }
}

/// Write a table as CSV to any writer.
pub fn write_table_to<W: Write>(table: &Table, writer: W, delimiter: u8) -> CalcResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(writer);

    csv_writer.write_record(&table.headers)?;
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer
        .flush()
        .map_err(|e| CalcError::serialization(e.to_string()))?;
    Ok(())
}

/// Write a table as CSV with atomic save semantics.
pub fn write_table(table: &Table, path: &Path, delimiter: u8) -> CalcResult<()> {
    let mut buffer = Vec::new();
    write_table_to(table, &mut buffer, delimiter)?;
    atomic_write(path, &buffer)
}

fn cell_position(row: usize, column: usize) -> CalcResult<(u32, u16)> {
    match (u32::try_from(row), u16::try_from(column)) {
        (Ok(row), Ok(column)) => Ok((row, column)),
        _ => Err(CalcError::serialization(format!(
            "cell at row {}, column {} is outside worksheet limits",
            row + 1,
            column + 1
        ))),
    }
}

/// Encode a table as a single-sheet `.xlsx` workbook.
///
/// Headers and text cells are written as strings, cells that parse as finite
/// numbers as numbers, and empty cells are left blank.
pub fn workbook_bytes(table: &Table) -> CalcResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (column, header) in table.headers.iter().enumerate() {
        let (row, column) = cell_position(0, column)?;
        worksheet.write_string(row, column, header.as_str())?;
    }

    for (index, cells) in table.rows.iter().enumerate() {
        for (column, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let (row, column) = cell_position(index + 1, column)?;
            match cell.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => worksheet.write_number(row, column, number)?,
                _ => worksheet.write_string(row, column, cell.as_str())?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write a table as an `.xlsx` workbook with atomic save semantics.
pub fn write_workbook(table: &Table, path: &Path) -> CalcResult<()> {
    atomic_write(path, &workbook_bytes(table)?)
}

/// Write a JSON report with atomic save semantics.
pub fn write_report(report: &BatchReport, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    atomic_write(path, json.as_bytes())
}

/// Build the JSON report for a processed table, tagged with its source.
pub fn build_report(processed: &ProcessedTable, source: Option<&str>) -> BatchReport {
    let report = BatchReport::new(processed);
    match source {
        Some(source) => report.with_source(source),
        None => report,
    }
}

/// Save processed results in the requested format.
pub fn save_results(processed: &ProcessedTable, path: &Path, options: &SaveOptions) -> CalcResult<()> {
    match options.format {
        OutputFormat::Csv => write_table(&processed.to_table(), path, options.delimiter)?,
        OutputFormat::Xlsx => write_workbook(&processed.to_table(), path)?,
        OutputFormat::Json => write_report(&build_report(processed, options.source.as_deref()), path)?,
    }
    tracing::info!(path = %path.display(), format = %options.format, "saved results");
    Ok(())
}

/// Lock file path guarding saves to `path`
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// Exclusive save lock; released and removed when dropped.
struct SaveLock {
    lock_path: PathBuf,
    lock_file: File,
}

impl SaveLock {
    fn acquire(path: &Path) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);

        // Not truncated on open: another writer may hold the lock
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_error(
                "lock",
                path.display().to_string(),
                "another process is writing this file",
            )
        })?;

        Ok(SaveLock { lock_path, lock_file })
    }
}

impl Drop for SaveLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
        let _ = fs2::FileExt::unlock(&self.lock_file);
    }
}

fn write_synced(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.sync_all()
}

/// Write bytes to `path` atomically.
///
/// The save process:
/// 1. Take the exclusive lock on `<path>.lock`
/// 2. Write a uniquely named temp file in the same directory, sync to disk (fsync)
/// 3. Rename over `path`, then release the lock
///
/// The temp file is deleted on any failure.
fn atomic_write(path: &Path, bytes: &[u8]) -> CalcResult<()> {
    let _lock = SaveLock::acquire(path)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".screwcalc-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| CalcError::file_error("create temp file", dir.display().to_string(), e.to_string()))?;

    write_synced(tmp.as_file_mut(), bytes).map_err(|e| {
        CalcError::file_error("write temp file", tmp.path().display().to_string(), e.to_string())
    })?;

    tmp.persist(path).map_err(|e| {
        CalcError::file_error("rename to final", path.display().to_string(), e.error.to_string())
    })?;

    Ok(())
}
