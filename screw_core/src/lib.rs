//! # screw_core - Power Screw Calculation Engine
//!
//! `screw_core` computes torque, efficiency and stress parameters for power
//! screw designs, one table row at a time. All inputs and outputs are
//! JSON-serializable plain value structs.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Thin Adapters**: Front ends only call [`validate_schema`] and
//!   [`compute_batch`] (or [`process_table`], which chains them)
//!
//! ## Quick Start
//!
//! ```rust
//! use screw_core::{calculate, PowerScrewInput};
//! use screw_core::units::Degrees;
//!
//! let input = PowerScrewInput {
//!     pitch: 2.0,
//!     threads: 1.0,
//!     nominal_diameter: 20.0,
//!     core_diameter: 17.0,
//!     friction_angle: Degrees(10.0),
//!     load: 5000.0,
//! };
//!
//! let result = calculate(&input).unwrap();
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! assert!(json.contains("\"mean_diameter\": 19.0"));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - The power screw formulas
//! - [`schema`] - Required input columns and appended output columns
//! - [`batch`] - Row-by-row evaluation with abort or flag error policies
//! - [`settings`] - Rounding rule and error policy
//! - [`table`] - Raw tabular data
//! - [`file_io`] - CSV and Excel reading, CSV/xlsx/JSON writing with atomic saves
//! - [`report`] - JSON batch report
//! - [`units`] - Angle newtypes
//! - [`errors`] - Structured error types

pub mod batch;
pub mod calculations;
pub mod errors;
pub mod file_io;
pub mod report;
pub mod schema;
pub mod settings;
pub mod table;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use batch::{compute_batch, process_table, BatchResult, ProcessedTable, RowError};
pub use calculations::{calculate, calculate_with, PowerScrewInput, PowerScrewResult};
pub use errors::{CalcError, CalcResult};
pub use file_io::{read_table, save_results, OutputFormat, SaveOptions};
pub use schema::validate_schema;
pub use settings::{load_settings, BatchSettings, ErrorPolicy, Rounding, RoundingMode};
pub use table::Table;
