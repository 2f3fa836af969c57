//! # Batch Settings
//!
//! Configuration for a batch run: how results are rounded and what happens
//! when a row cannot be computed. Settings serialize to JSON so a team can keep
//! a shared settings file next to its input tables.
//!
//! ## Example
//!
//! ```rust
//! use screw_core::settings::{BatchSettings, ErrorPolicy, RoundingMode};
//!
//! let settings: BatchSettings = serde_json::from_str(r#"{ "error_policy": "flag" }"#).unwrap();
//! assert_eq!(settings.error_policy, ErrorPolicy::Flag);
//! assert_eq!(settings.rounding.mode, RoundingMode::HalfEven);
//! assert_eq!(settings.rounding.decimals, 3);
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Default number of decimals every reported value is rounded to
pub const DEFAULT_DECIMALS: u32 = 3;

/// Largest decimal count that still leaves headroom in an f64 mantissa
pub const MAX_DECIMALS: u32 = 12;

/// 2^53: every f64 at or above this magnitude is already an integer
const INTEGRAL_F64: f64 = 9_007_199_254_740_992.0;

/// Tie-break rule used when a value sits exactly halfway between two
/// representable results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Banker's rounding: 0.0625 -> 0.062
    #[default]
    HalfEven,
    /// Commercial rounding: 0.0625 -> 0.063
    HalfAwayFromZero,
}

impl RoundingMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            RoundingMode::HalfEven => "half-even",
            RoundingMode::HalfAwayFromZero => "half-away",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "half-even" | "even" | "bankers" => Ok(RoundingMode::HalfEven),
            "half-away" | "half-away-from-zero" | "away" => Ok(RoundingMode::HalfAwayFromZero),
            other => Err(format!(
                "unknown rounding mode '{}' (expected half-even or half-away)",
                other
            )),
        }
    }
}

/// Rounding rule applied to every reported value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rounding {
    pub mode: RoundingMode,
    pub decimals: u32,
}

impl Default for Rounding {
    fn default() -> Self {
        Rounding {
            mode: RoundingMode::default(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl Rounding {
    pub fn new(mode: RoundingMode, decimals: u32) -> Self {
        Rounding { mode, decimals }
    }

    /// Round `value` to `decimals` places.
    ///
    /// The tie rule is applied to the exact binary value of `value`, so
    /// `0.1235` (stored as 0.12349999...) rounds down to `0.123` in either
    /// mode. Non-finite values and values too large to carry a fraction pass
    /// through untouched. A result of negative zero is normalized to `0.0` so
    /// it never prints as `-0`.
    pub fn apply(&self, value: f64) -> f64 {
        if !value.is_finite() || value.abs() >= INTEGRAL_F64 {
            return value;
        }
        // Only magnitudes below Decimal's smallest step fail to convert
        let Some(exact) = Decimal::from_f64_retain(value) else {
            return 0.0;
        };

        let strategy = match self.mode {
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
        };
        // Decimal text parses to the nearest f64, unlike mantissa/scale division
        let rounded = exact
            .round_dp_with_strategy(self.decimals, strategy)
            .to_string()
            .parse::<f64>()
            .unwrap_or(value);

        if rounded == 0.0 {
            0.0
        } else {
            rounded
        }
    }
}

/// What a batch does when a row cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop at the first failing row and report its row number
    #[default]
    Abort,
    /// Record the failure against the row and keep going
    Flag,
}

/// Settings for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub rounding: Rounding,
    pub error_policy: ErrorPolicy,
}

impl BatchSettings {
    /// Validate settings values.
    pub fn validate(&self) -> CalcResult<()> {
        if self.rounding.decimals > MAX_DECIMALS {
            return Err(CalcError::domain(
                "rounding.decimals",
                format!(
                    "{} decimals requested, at most {} are supported",
                    self.rounding.decimals, MAX_DECIMALS
                ),
            ));
        }
        Ok(())
    }
}

/// Load and validate settings from a JSON file.
///
/// Missing keys take their defaults, so `{}` is a valid settings file.
pub fn load_settings(path: &Path) -> CalcResult<BatchSettings> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read settings", path.display().to_string(), e.to_string()))?;

    let settings: BatchSettings = serde_json::from_str(&contents).map_err(|e| {
        CalcError::serialization(format!("Invalid settings in {}: {}", path.display(), e))
    })?;

    settings.validate()?;
    tracing::debug!(path = %path.display(), ?settings, "loaded batch settings");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_even_ties() {
        let rounding = Rounding::new(RoundingMode::HalfEven, 3);
        assert_eq!(rounding.apply(0.0625), 0.062);
        assert_eq!(rounding.apply(-0.0625), -0.062);
        // 0.0635 is stored slightly above the tie
        assert_eq!(rounding.apply(0.0635), 0.064);
    }

    #[test]
    fn test_half_away_ties() {
        let rounding = Rounding::new(RoundingMode::HalfAwayFromZero, 3);
        assert_eq!(rounding.apply(0.0625), 0.063);
        assert_eq!(rounding.apply(-0.0625), -0.063);
    }

    #[test]
    fn test_values_stored_below_a_tie_round_down() {
        let even = Rounding::new(RoundingMode::HalfEven, 3);
        let away = Rounding::new(RoundingMode::HalfAwayFromZero, 3);

        assert_eq!(even.apply(0.1235), 0.123);
        assert_eq!(even.apply(0.0055), 0.005);
        assert_eq!(away.apply(0.1235), 0.123);
        assert_eq!(away.apply(1.0005), 1.0);
        assert_eq!(away.apply(-1.0005), -1.0);
        assert_eq!(Rounding::new(RoundingMode::HalfEven, 2).apply(2.675), 2.67);
    }

    #[test]
    fn test_rounding_non_ties_agree() {
        let even = Rounding::new(RoundingMode::HalfEven, 3);
        let away = Rounding::new(RoundingMode::HalfAwayFromZero, 3);
        for value in [1.9190518546891626, 10026.31715187819, -1591.5494309189535] {
            assert_eq!(even.apply(value), away.apply(value));
        }
        assert_eq!(even.apply(1.9190518546891626), 1.919);
        assert_eq!(even.apply(10026.31715187819), 10026.317);
    }

    #[test]
    fn test_large_values_pass_through() {
        let rounding = Rounding::new(RoundingMode::HalfEven, 12);
        assert_eq!(rounding.apply(1e306), 1e306);
        assert_eq!(rounding.apply(-1.7e308), -1.7e308);
        assert_eq!(rounding.apply(1e20), 1e20);
        assert_eq!(Rounding::default().apply(123456789.0126), 123456789.013);
    }

    #[test]
    fn test_tiny_values_round_to_zero() {
        let value = Rounding::default().apply(-1e-300);
        assert_eq!(value, 0.0);
        assert!(value.is_sign_positive());
    }

    #[test]
    fn test_negative_zero_normalized() {
        let rounding = Rounding::default();
        let value = rounding.apply(-0.0001);
        assert_eq!(value, 0.0);
        assert!(value.is_sign_positive());
    }

    #[test]
    fn test_rounding_mode_parsing() {
        assert_eq!("half-even".parse::<RoundingMode>().unwrap(), RoundingMode::HalfEven);
        assert_eq!("HALF_AWAY".parse::<RoundingMode>().unwrap(), RoundingMode::HalfAwayFromZero);
        assert!("nearest".parse::<RoundingMode>().is_err());
    }

    #[test]
    fn test_settings_defaults_from_empty_json() {
        let settings: BatchSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, BatchSettings::default());
        assert_eq!(settings.error_policy, ErrorPolicy::Abort);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = BatchSettings {
            rounding: Rounding::new(RoundingMode::HalfAwayFromZero, 4),
            error_policy: ErrorPolicy::Flag,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"half_away_from_zero\""));
        assert!(json.contains("\"flag\""));
        let roundtrip: BatchSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, settings);
    }

    #[test]
    fn test_validate_rejects_too_many_decimals() {
        let settings = BatchSettings {
            rounding: Rounding::new(RoundingMode::HalfEven, 20),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "rounding": { "decimals": 2 } }"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.rounding.decimals, 2);
        assert_eq!(settings.rounding.mode, RoundingMode::HalfEven);
    }

    #[test]
    fn test_load_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
