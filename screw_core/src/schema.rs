//! # Table Schema
//!
//! Column names of the input and output tables, and the schema check that runs
//! before any row is touched.
//!
//! ## Example
//!
//! ```rust
//! use screw_core::schema::{validate_schema, InputColumn};
//!
//! let headers = ["Label", "Pitch", "Threads", "NominalDiameter", "CoreDiameter", "FrictionAngle", "Load"];
//! let columns = validate_schema(&headers).unwrap();
//! assert_eq!(columns.index(InputColumn::Pitch), 1);
//!
//! let err = validate_schema(&["Pitch", "Threads"]).unwrap_err();
//! assert!(err.to_string().contains("NominalDiameter"));
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Columns appended to every output row, in order
pub const OUTPUT_COLUMNS: [&str; 12] = [
    "MeanDiameter",
    "Lead",
    "HelixAngle(deg)",
    "TorqueRaise",
    "TorqueLower",
    "Efficiency",
    "MaximumEfficiency",
    "OverallEfficiency",
    "ShearStress",
    "CompressiveStress",
    "MaxPrincipalStress",
    "MaxShearingStress",
];

/// Trailing column carrying the row error when failures are flagged
pub const ERROR_COLUMN: &str = "Error";

/// A required input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputColumn {
    Pitch,
    Threads,
    NominalDiameter,
    CoreDiameter,
    FrictionAngle,
    Load,
}

impl InputColumn {
    /// All required columns in canonical order
    pub const ALL: [InputColumn; 6] = [
        InputColumn::Pitch,
        InputColumn::Threads,
        InputColumn::NominalDiameter,
        InputColumn::CoreDiameter,
        InputColumn::FrictionAngle,
        InputColumn::Load,
    ];

    /// Header text as it must appear in the input table
    pub fn header(&self) -> &'static str {
        match self {
            InputColumn::Pitch => "Pitch",
            InputColumn::Threads => "Threads",
            InputColumn::NominalDiameter => "NominalDiameter",
            InputColumn::CoreDiameter => "CoreDiameter",
            InputColumn::FrictionAngle => "FrictionAngle",
            InputColumn::Load => "Load",
        }
    }

    fn position(&self) -> usize {
        *self as usize
    }
}

/// Positions of the required columns within a table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [usize; 6],
}

impl ColumnMap {
    /// Index of `column` in the table header
    pub fn index(&self, column: InputColumn) -> usize {
        self.indices[column.position()]
    }

    /// Check whether a header position holds one of the required columns
    pub fn is_required(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }
}

/// Check that every required column is present.
///
/// Header cells are compared after trimming surrounding whitespace; matching is
/// case-sensitive. When a name appears twice the first occurrence is used.
///
/// # Returns
///
/// * `Ok(ColumnMap)` - Where each required column sits
/// * `Err(CalcError::MissingColumns)` - Every absent column, in canonical order
pub fn validate_schema<S: AsRef<str>>(columns: &[S]) -> CalcResult<ColumnMap> {
    let mut indices = [0usize; 6];
    let mut missing = Vec::new();

    for column in InputColumn::ALL {
        match columns
            .iter()
            .position(|c| c.as_ref().trim() == column.header())
        {
            Some(index) => indices[column.position()] = index,
            None => missing.push(column.header()),
        }
    }

    if !missing.is_empty() {
        tracing::debug!(?missing, "input table failed schema check");
        return Err(CalcError::missing_columns(missing));
    }

    Ok(ColumnMap { indices })
}
