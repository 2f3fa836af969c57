//! # Error Types
//!
//! Structured error types for screw_core. These errors are designed to be
//! informative for both humans and tooling, providing enough context to
//! understand and fix an input table without reading the code.
//!
//! ## Taxonomy
//!
//! - [`CalcError::MissingColumns`] - schema error, aborts before any row is read
//! - [`CalcError::DomainError`] - physically invalid inputs (zero diameter, tan at 90°)
//! - [`CalcError::InvalidInput`] - a table cell that is not a number
//! - [`CalcError::RowFailed`] - a row error that aborted the whole batch
//! - [`CalcError::FileError`] - read/write failures, no partial output is left behind
//!
//! ## Example
//!
//! ```rust
//! use screw_core::errors::{CalcError, CalcResult};
//!
//! fn check_core_diameter(core_diameter: f64) -> CalcResult<()> {
//!     if core_diameter == 0.0 {
//!         return Err(CalcError::domain("core_diameter", "division by zero"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_core_diameter(0.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for screw_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation and table operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// One or more required columns are absent from the input table
    #[error("Input table missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// Inputs are physically invalid or produce a non-finite result
    #[error("Domain error in '{field}': {reason}")]
    DomainError { field: String, reason: String },

    /// A table cell could not be read as a number
    #[error("Invalid value '{value}' in column '{column}' at row {row}: {reason}")]
    InvalidInput {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// A row failed and the batch was aborted (row numbers are 1-based data rows)
    #[error("Row {row}: {source}")]
    RowFailed { row: usize, source: Box<CalcError> },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// CSV/JSON/xlsx encoding or decoding error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create a MissingColumns error
    pub fn missing_columns<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CalcError::MissingColumns {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a DomainError
    pub fn domain(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::DomainError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidInput {
            row,
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error with the row that produced it
    pub fn row_failed(row: usize, source: CalcError) -> Self {
        CalcError::RowFailed {
            row,
            source: Box::new(source),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// The 1-based row this error is attached to, if any
    pub fn row(&self) -> Option<usize> {
        match self {
            CalcError::InvalidInput { row, .. } | CalcError::RowFailed { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::MissingColumns { .. } => "SCHEMA_ERROR",
            CalcError::DomainError { .. } => "DOMAIN_ERROR",
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::RowFailed { .. } => "ROW_FAILED",
            CalcError::FileError { .. } => "IO_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<csv::Error> for CalcError {
    fn from(err: csv::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for CalcError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        CalcError::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::row_failed(3, CalcError::domain("core_diameter", "division by zero"));
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_missing_columns_message_lists_names() {
        let error = CalcError::missing_columns(["CoreDiameter", "Load"]);
        assert_eq!(
            error.to_string(),
            "Input table missing required columns: CoreDiameter, Load"
        );
        assert_eq!(error.error_code(), "SCHEMA_ERROR");
    }

    #[test]
    fn test_row_failed_names_row() {
        let error = CalcError::row_failed(3, CalcError::domain("core_diameter", "must be non-zero"));
        assert_eq!(error.row(), Some(3));
        assert!(error.to_string().starts_with("Row 3: "));
        assert!(error.to_string().contains("core_diameter"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_columns(["Load"]).error_code(), "SCHEMA_ERROR");
        assert_eq!(CalcError::domain("x", "y").error_code(), "DOMAIN_ERROR");
        assert_eq!(CalcError::file_error("open", "a.csv", "denied").error_code(), "IO_ERROR");
    }
}
