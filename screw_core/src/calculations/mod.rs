//! # Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(input) -> Result<*Result, CalcError>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`power_screw`] - Torque, efficiency and core stresses of a power screw

pub mod power_screw;

pub use power_screw::{calculate, calculate_with, PowerScrewInput, PowerScrewResult};
