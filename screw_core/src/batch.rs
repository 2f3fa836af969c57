//! # Batch Evaluation
//!
//! Runs the power screw calculation over every row of a table. Rows are
//! independent: each is parsed and computed on its own and written exactly
//! once, in input order.
//!
//! The schema check always runs first, so a table missing a required column
//! fails before any row is evaluated. What happens to a row that cannot be
//! computed depends on [`ErrorPolicy`]:
//!
//! - `Abort` - the batch stops and the error names the 1-based row
//! - `Flag` - the row is recorded in [`BatchResult::errors`] and the rest still compute
//!
//! ## Example
//!
//! ```rust
//! use screw_core::batch::process_table;
//! use screw_core::settings::BatchSettings;
//! use screw_core::table::Table;
//!
//! let table = Table::new(
//!     ["Pitch", "Threads", "NominalDiameter", "CoreDiameter", "FrictionAngle", "Load"]
//!         .iter()
//!         .map(|h| h.to_string())
//!         .collect(),
//! )
//! .with_row(["2", "1", "20", "17", "10", "5000"]);
//!
//! let processed = process_table(&table, &BatchSettings::default()).unwrap();
//! let output = processed.to_table();
//! assert_eq!(output.headers.len(), 18);
//! assert_eq!(output.cell(0, 6), "19");
//! ```

use serde::{Deserialize, Serialize};

use crate::calculations::power_screw::{calculate_with, PowerScrewInput, PowerScrewResult};
use crate::errors::{CalcError, CalcResult};
use crate::schema::{validate_schema, ColumnMap, InputColumn, ERROR_COLUMN, OUTPUT_COLUMNS};
use crate::settings::{BatchSettings, ErrorPolicy};
use crate::table::Table;
use crate::units::Degrees;

/// A row that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    pub error: CalcError,
}

/// Results of a batch, one slot per input row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// `None` where the row failed
    pub results: Vec<Option<PowerScrewResult>>,
    pub errors: Vec<RowError>,
}

impl BatchResult {
    pub fn computed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    /// Error recorded against a 1-based row
    pub fn error_for(&self, row: usize) -> Option<&CalcError> {
        self.errors.iter().find(|e| e.row == row).map(|e| &e.error)
    }
}

/// Compute every record.
///
/// # Returns
///
/// * `Ok(BatchResult)` - Under `Abort`, only when every row computed
/// * `Err(CalcError::RowFailed)` - Under `Abort`, the first failing row
pub fn compute_batch(rows: &[PowerScrewInput], settings: &BatchSettings) -> CalcResult<BatchResult> {
    settings.validate()?;
    collect_outcomes(
        rows.iter().map(|input| calculate_with(input, &settings.rounding)),
        settings.error_policy,
    )
}

/// Apply the error policy to per-row outcomes.
fn collect_outcomes<I>(outcomes: I, policy: ErrorPolicy) -> CalcResult<BatchResult>
where
    I: IntoIterator<Item = CalcResult<PowerScrewResult>>,
{
    let mut batch = BatchResult::default();

    for (index, outcome) in outcomes.into_iter().enumerate() {
        let row = index + 1;
        match outcome {
            Ok(result) => batch.results.push(Some(result)),
            Err(error) => match policy {
                ErrorPolicy::Abort => {
                    tracing::debug!(row, %error, "aborting batch");
                    return Err(CalcError::row_failed(row, error));
                }
                ErrorPolicy::Flag => {
                    tracing::warn!(row, %error, "row flagged");
                    batch.results.push(None);
                    batch.errors.push(RowError { row, error });
                }
            },
        }
    }

    Ok(batch)
}

/// Read the six required cells of one data row.
///
/// `row` is the 1-based row number used in error messages.
pub fn parse_row(cells: &[String], columns: &ColumnMap, row: usize) -> CalcResult<PowerScrewInput> {
    let number = |column: InputColumn| -> CalcResult<f64> {
        let raw = cells.get(columns.index(column)).map(String::as_str).unwrap_or("");
        let text = raw.trim();
        if text.is_empty() {
            return Err(CalcError::invalid_input(row, column.header(), raw, "cell is empty"));
        }
        text.parse::<f64>()
            .map_err(|_| CalcError::invalid_input(row, column.header(), raw, "not a number"))
    };

    Ok(PowerScrewInput {
        pitch: number(InputColumn::Pitch)?,
        threads: number(InputColumn::Threads)?,
        nominal_diameter: number(InputColumn::NominalDiameter)?,
        core_diameter: number(InputColumn::CoreDiameter)?,
        friction_angle: Degrees(number(InputColumn::FrictionAngle)?),
        load: number(InputColumn::Load)?,
    })
}

/// A table after evaluation: the source rows, what was read from them, and
/// what was computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTable {
    pub source: Table,
    /// Parsed inputs, `None` where a cell could not be read
    pub inputs: Vec<Option<PowerScrewInput>>,
    pub batch: BatchResult,
    /// Settings the table was processed with
    pub settings: BatchSettings,
}

impl ProcessedTable {
    /// Output table: every source column, then [`OUTPUT_COLUMNS`], then
    /// [`ERROR_COLUMN`] when failures are flagged.
    pub fn to_table(&self) -> Table {
        let flag = self.settings.error_policy == ErrorPolicy::Flag;
        let width = self.source.headers.len();

        let mut headers = self.source.headers.clone();
        headers.extend(OUTPUT_COLUMNS.iter().map(|c| c.to_string()));
        if flag {
            headers.push(ERROR_COLUMN.to_string());
        }

        let mut table = Table::new(headers);
        for (index, result) in self.batch.results.iter().enumerate() {
            let mut cells: Vec<String> = (0..width)
                .map(|col| self.source.cell(index, col).to_string())
                .collect();

            match result {
                Some(result) => cells.extend(result.values().iter().map(|v| format_value(*v))),
                None => cells.extend(std::iter::repeat(String::new()).take(OUTPUT_COLUMNS.len())),
            }

            if flag {
                let message = self
                    .batch
                    .error_for(index + 1)
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                cells.push(message);
            }
            table.rows.push(cells);
        }
        table
    }
}

/// Text form of a computed value.
///
/// Values are already rounded, so the shortest round-trip representation is
/// exactly the rounded decimal (`19.0` prints as `19`).
pub fn format_value(value: f64) -> String {
    value.to_string()
}

/// Validate, parse and compute a whole table.
///
/// # Returns
///
/// * `Ok(ProcessedTable)` - Every row computed, or failures flagged
/// * `Err(CalcError::MissingColumns)` - Schema check failed, no row was evaluated
/// * `Err(CalcError::RowFailed)` - Under `Abort`, the first failing row
pub fn process_table(table: &Table, settings: &BatchSettings) -> CalcResult<ProcessedTable> {
    settings.validate()?;
    let columns = validate_schema(table.headers.as_slice())?;

    let inputs: Vec<CalcResult<PowerScrewInput>> = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, cells)| parse_row(cells, &columns, index + 1))
        .collect();

    let outcomes = inputs.iter().map(|input| match input {
        Ok(input) => calculate_with(input, &settings.rounding),
        Err(error) => Err(error.clone()),
    });
    let batch = collect_outcomes(outcomes, settings.error_policy)?;

    tracing::info!(
        rows = table.len(),
        computed = batch.computed_count(),
        failed = batch.failed_count(),
        "processed table"
    );

    Ok(ProcessedTable {
        source: table.clone(),
        inputs: inputs.into_iter().map(Result::ok).collect(),
        batch,
        settings: *settings,
    })
}
