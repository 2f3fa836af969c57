//! # Power Screw Calculation
//!
//! Torque, efficiency and stress parameters for a square-thread power screw
//! under axial load.
//!
//! ## Assumptions
//!
//! - Mean diameter taken as nominal diameter less half a pitch
//! - Friction expressed as a friction angle (φ = atan μ)
//! - Torque and stresses use consistent units (mm and N give N·mm and N/mm²)
//! - Stresses are evaluated on the core (root) section
//!
//! ## Example
//!
//! ```rust
//! use screw_core::calculations::power_screw::{calculate, PowerScrewInput};
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
//!
//! assert_eq!(result.mean_diameter, 19.0);
//! assert_eq!(result.lead, 2.0);
//! assert_eq!(result.helix_angle_deg, 1.919);
//! println!("Raise torque: {:.1}", result.torque_raise);
//! println!("Self-locking: {}", result.is_self_locking());
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::settings::Rounding;
use crate::units::{Degrees, Radians};

/// Input parameters for one power screw design.
///
/// ## JSON Example
///
/// ```json
/// {
///   "pitch": 2.0,
///   "threads": 1.0,
///   "nominal_diameter": 20.0,
///   "core_diameter": 17.0,
///   "friction_angle": 10.0,
///   "load": 5000.0
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerScrewInput {
    /// Thread pitch (length)
    pub pitch: f64,

    /// Number of thread starts
    pub threads: f64,

    /// Outer (major) diameter
    pub nominal_diameter: f64,

    /// Root (minor) diameter, smaller than the nominal diameter
    pub core_diameter: f64,

    /// Friction angle φ in degrees
    pub friction_angle: Degrees,

    /// Axial load (force)
    pub load: f64,
}

impl PowerScrewInput {
    /// Reject inputs the formulas cannot evaluate.
    ///
    /// Only conditions that make the math undefined are errors. Geometry that is
    /// merely unusual (core diameter not smaller than nominal) is logged and
    /// computed anyway.
    pub fn validate(&self) -> CalcResult<()> {
        let fields = [
            ("pitch", self.pitch),
            ("threads", self.threads),
            ("nominal_diameter", self.nominal_diameter),
            ("core_diameter", self.core_diameter),
            ("friction_angle", self.friction_angle.0),
            ("load", self.load),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(CalcError::domain(field, format!("{} is not a finite number", value)));
            }
        }

        if self.nominal_diameter == 0.0 {
            return Err(CalcError::domain(
                "nominal_diameter",
                "Nominal diameter must be non-zero (division by zero)",
            ));
        }
        if self.core_diameter == 0.0 {
            return Err(CalcError::domain(
                "core_diameter",
                "Core diameter must be non-zero (division by zero)",
            ));
        }

        if self.core_diameter >= self.nominal_diameter {
            tracing::warn!(
                core_diameter = self.core_diameter,
                nominal_diameter = self.nominal_diameter,
                "core diameter is not smaller than nominal diameter"
            );
        }
        Ok(())
    }

    /// Mean diameter dm = d - p/2
    pub fn mean_diameter(&self) -> f64 {
        self.nominal_diameter - 0.5 * self.pitch
    }

    /// Lead L = n * p
    pub fn lead(&self) -> f64 {
        self.threads * self.pitch
    }
}

/// Results from a power screw calculation.
///
/// Every numeric field is rounded with the same [`Rounding`] rule.
///
/// ## JSON Example
///
/// ```json
/// {
///   "mean_diameter": 19.0,
///   "lead": 2.0,
///   "helix_angle_deg": 1.919,
///   "torque_raise": 10026.317,
///   "torque_lower": 6744.137,
///   "efficiency": 0.159,
///   "max_efficiency": 0.704,
///   "overall_efficiency": 1591.549,
///   "shear_stress": 10.394,
///   "compressive_stress": 22.028,
///   "max_principal_stress": 4.13,
///   "max_shearing_stress": 24.357,
///   "self_locking": true
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerScrewResult {
    /// Mean thread diameter dm
    pub mean_diameter: f64,

    /// Axial advance per revolution
    pub lead: f64,

    /// Helix (lead) angle α in degrees
    pub helix_angle_deg: f64,

    /// Torque to raise the load, W·dm·tan(φ+α)/2
    pub torque_raise: f64,

    /// Torque to lower the load, W·dm·tan(φ-α)/2 (negative when the screw overhauls)
    pub torque_lower: f64,

    /// tan α / tan(α+φ)
    pub efficiency: f64,

    /// (1 - sin φ) / (1 + sin φ)
    pub max_efficiency: f64,

    /// W·L / 2π
    pub overall_efficiency: f64,

    /// Torsional shear stress on the core, 16T/(π dc³)
    pub shear_stress: f64,

    /// Direct compressive stress on the core, 4W/(π dc²)
    pub compressive_stress: f64,

    pub max_principal_stress: f64,

    pub max_shearing_stress: f64,

    /// Friction angle not below the helix angle, compared before rounding
    pub self_locking: bool,
}

impl PowerScrewResult {
    /// Check if the screw holds its load without an applied lowering torque.
    ///
    /// Decided from the angles (φ ≥ α), so it does not depend on the sign of
    /// the load. Purely descriptive; the torque values are reported unchanged.
    pub fn is_self_locking(&self) -> bool {
        self.self_locking
    }

    /// Values in output column order
    pub fn values(&self) -> [f64; 12] {
        [
            self.mean_diameter,
            self.lead,
            self.helix_angle_deg,
            self.torque_raise,
            self.torque_lower,
            self.efficiency,
            self.max_efficiency,
            self.overall_efficiency,
            self.shear_stress,
            self.compressive_stress,
            self.max_principal_stress,
            self.max_shearing_stress,
        ]
    }
}

/// tan(angle), rejecting arguments at or numerically next to ±90°.
fn checked_tan(angle: Radians, field: &str) -> CalcResult<f64> {
    if angle.cos().abs() < f64::EPSILON {
        return Err(CalcError::domain(
            field,
            format!(
                "tangent undefined at {:.3}°",
                Degrees::from(angle).value()
            ),
        ));
    }
    finite(angle.tan(), field)
}

fn finite(value: f64, field: &str) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::domain(field, format!("result is not finite ({})", value)))
    }
}

/// Calculate power screw parameters with the default rounding (3 decimals, half-even).
pub fn calculate(input: &PowerScrewInput) -> CalcResult<PowerScrewResult> {
    calculate_with(input, &Rounding::default())
}

/// Calculate power screw parameters.
///
/// # Arguments
///
/// * `input` - Screw geometry, friction angle and load
/// * `rounding` - Rule applied to every reported value
///
/// # Returns
///
/// * `Ok(PowerScrewResult)` - Calculation results
/// * `Err(CalcError::DomainError)` - Zero diameter, non-finite input, or a
///   tangent evaluated at ±90°
pub fn calculate_with(input: &PowerScrewInput, rounding: &Rounding) -> CalcResult<PowerScrewResult> {
    input.validate()?;

    let load = input.load;
    let core_diameter = input.core_diameter;

    let mean_diameter = input.mean_diameter();
    let lead = input.lead();
    let helix = Radians::atan(finite(lead / (PI * mean_diameter), "helix_angle")?);
    let friction: Radians = input.friction_angle.into();

    let tan_helix = checked_tan(helix, "helix_angle")?;
    let tan_raise = checked_tan(friction + helix, "torque_raise")?;
    let tan_lower = checked_tan(friction - helix, "torque_lower")?;

    let torque_raise = load * mean_diameter * tan_raise / 2.0;
    let torque_lower = load * mean_diameter * tan_lower / 2.0;

    let efficiency = finite(tan_helix / tan_raise, "efficiency")?;
    let max_efficiency = finite(
        (1.0 - friction.sin()) / (1.0 + friction.sin()),
        "max_efficiency",
    )?;
    let overall_efficiency = (load * lead) / (2.0 * PI);

    let shear_stress = 16.0 * torque_raise / (PI * core_diameter.powi(3));
    let compressive_stress = 4.0 * load / (PI * core_diameter.powi(2));

    // hypot keeps sqrt(a² + b²) finite when the squares alone would overflow
    let half_compressive = compressive_stress / 2.0;
    let max_principal_stress = -half_compressive + half_compressive.hypot(shear_stress);
    let max_shearing_stress = compressive_stress.hypot(shear_stress);

    let helix_angle_deg = Degrees::from(helix).value();

    let result = PowerScrewResult {
        mean_diameter: rounding.apply(mean_diameter),
        lead: rounding.apply(lead),
        helix_angle_deg: rounding.apply(helix_angle_deg),
        torque_raise: rounding.apply(torque_raise),
        torque_lower: rounding.apply(torque_lower),
        efficiency: rounding.apply(efficiency),
        max_efficiency: rounding.apply(max_efficiency),
        overall_efficiency: rounding.apply(overall_efficiency),
        shear_stress: rounding.apply(shear_stress),
        compressive_stress: rounding.apply(compressive_stress),
        max_principal_stress: rounding.apply(max_principal_stress),
        max_shearing_stress: rounding.apply(max_shearing_stress),
        self_locking: friction >= helix,
    };

    if let Some(value) = result.values().iter().find(|v| !v.is_finite()) {
        return Err(CalcError::domain("result", format!("result is not finite ({})", value)));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RoundingMode;

    fn test_screw() -> PowerScrewInput {
        PowerScrewInput {
            pitch: 2.0,
            threads: 1.0,
            nominal_diameter: 20.0,
            core_diameter: 17.0,
            friction_angle: Degrees(10.0),
            load: 5000.0,
        }
    }

    #[test]
    fn test_mean_diameter_and_lead() {
        let screw = test_screw();
        assert_eq!(screw.mean_diameter(), 19.0);
        assert_eq!(screw.lead(), 2.0);

        let multi_start = PowerScrewInput {
            pitch: 5.0,
            threads: 2.0,
            nominal_diameter: 40.0,
            ..test_screw()
        };
        assert_eq!(multi_start.mean_diameter(), 37.5);
        assert_eq!(multi_start.lead(), 10.0);
    }

    #[test]
    fn test_reference_screw() {
        let result = calculate(&test_screw()).unwrap();

        assert_eq!(result.mean_diameter, 19.0);
        assert_eq!(result.lead, 2.0);
        assert_eq!(result.helix_angle_deg, 1.919);
        assert!((result.torque_raise - 10026.317).abs() < 1e-9);
        assert!((result.torque_lower - 6744.137).abs() < 1e-9);
        assert!((result.efficiency - 0.159).abs() < 1e-9);
        assert!((result.max_efficiency - 0.704).abs() < 1e-9);
        assert!((result.overall_efficiency - 1591.549).abs() < 1e-9);
        assert!((result.shear_stress - 10.394).abs() < 1e-9);
        assert!((result.compressive_stress - 22.028).abs() < 1e-9);
        assert!((result.max_principal_stress - 4.13).abs() < 1e-9);
        assert!((result.max_shearing_stress - 24.357).abs() < 1e-9);
    }

    #[test]
    fn test_principal_stress_bounds() {
        let result = calculate(&test_screw()).unwrap();
        // σ1 = -σc/2 + sqrt((σc/2)² + τ²) is never below zero and never above τ
        assert!(result.max_principal_stress >= -result.compressive_stress / 2.0);
        assert!(result.max_principal_stress >= 0.0);
        assert!(result.max_principal_stress <= result.shear_stress);
        assert!(result.max_shearing_stress >= result.compressive_stress);
    }

    #[test]
    fn test_multi_start_screw() {
        let input = PowerScrewInput {
            pitch: 5.0,
            threads: 2.0,
            nominal_diameter: 40.0,
            core_diameter: 32.0,
            friction_angle: Degrees(6.0),
            load: 10000.0,
        };
        let result = calculate(&input).unwrap();
        assert_eq!(result.helix_angle_deg, 4.852);
        assert!((result.torque_raise - 35943.207).abs() < 1e-9);
        assert!((result.efficiency - 0.443).abs() < 1e-9);
        assert!((result.max_shearing_stress - 13.631).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let input = test_screw();
        let first = calculate(&input).unwrap();
        let second = calculate(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_friction_is_ideal() {
        let input = PowerScrewInput {
            friction_angle: Degrees(0.0),
            ..test_screw()
        };
        let result = calculate(&input).unwrap();
        assert_eq!(result.max_efficiency, 1.0);
        assert_eq!(result.efficiency, 1.0);
        // Without friction the lowering torque is the raising torque reversed
        assert_eq!(result.torque_lower, -result.torque_raise);
        assert!(!result.is_self_locking());
    }

    #[test]
    fn test_self_locking_reported_not_interpreted() {
        let locking = calculate(&test_screw()).unwrap();
        assert!(locking.is_self_locking());

        // Friction below the helix angle: lowering torque goes negative
        let overhauling = PowerScrewInput {
            friction_angle: Degrees(1.0),
            ..test_screw()
        };
        let result = calculate(&overhauling).unwrap();
        assert!(result.torque_lower < 0.0);
        assert!(!result.is_self_locking());
    }

    #[test]
    fn test_self_locking_ignores_load_sign() {
        let pulling = PowerScrewInput {
            load: -5000.0,
            ..test_screw()
        };
        let result = calculate(&pulling).unwrap();
        assert!((result.torque_lower + 6744.137).abs() < 1e-9);
        assert!(result.is_self_locking());
    }

    #[test]
    fn test_huge_load_stays_finite() {
        let input = PowerScrewInput {
            load: 1e305,
            ..test_screw()
        };
        let result = calculate(&input).unwrap();
        assert!(result.values().iter().all(|v| v.is_finite()));
        assert!(result.torque_raise > 1e305);
        assert!(result.max_shearing_stress >= result.compressive_stress);
        assert!(result.max_principal_stress >= 0.0);
    }

    #[test]
    fn test_negative_load_is_computed() {
        let input = PowerScrewInput {
            pitch: 1.5,
            threads: 1.0,
            nominal_diameter: 12.0,
            core_diameter: 10.0,
            friction_angle: Degrees(3.0),
            load: -2000.0,
        };
        let result = calculate(&input).unwrap();
        assert!((result.torque_raise + 1069.431).abs() < 1e-9);
        assert!((result.compressive_stress + 25.465).abs() < 1e-9);
        assert!((result.max_principal_stress - 26.581).abs() < 1e-9);
    }

    #[test]
    fn test_zero_core_diameter_is_domain_error() {
        let input = PowerScrewInput {
            core_diameter: 0.0,
            ..test_screw()
        };
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "DOMAIN_ERROR");
        assert!(err.to_string().contains("core_diameter"));
    }

    #[test]
    fn test_zero_nominal_diameter_is_domain_error() {
        let input = PowerScrewInput {
            nominal_diameter: 0.0,
            ..test_screw()
        };
        let err = calculate(&input).unwrap_err();
        assert!(matches!(err, CalcError::DomainError { ref field, .. } if field == "nominal_diameter"));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let input = PowerScrewInput {
            load: f64::NAN,
            ..test_screw()
        };
        assert!(calculate(&input).is_err());
    }

    #[test]
    fn test_friction_at_ninety_degrees_rejected() {
        // φ + α passes through 90°; tan(90° - α + α) is undefined
        let input = PowerScrewInput {
            friction_angle: Degrees(90.0),
            threads: 0.0,
            ..test_screw()
        };
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "DOMAIN_ERROR");
    }

    #[test]
    fn test_zero_mean_diameter_rejected() {
        // nominal = p/2 puts the helix angle at 90°
        let input = PowerScrewInput {
            nominal_diameter: 1.0,
            ..test_screw()
        };
        assert!(calculate(&input).is_err());
    }

    #[test]
    fn test_rounding_applied_to_every_field() {
        let rounding = Rounding::new(RoundingMode::HalfEven, 1);
        let result = calculate_with(&test_screw(), &rounding).unwrap();
        assert_eq!(result.helix_angle_deg, 1.9);
        assert_eq!(result.torque_raise, 10026.3);
        assert_eq!(result.max_principal_stress, 4.1);
        for value in result.values() {
            assert_eq!(value, rounding.apply(value));
        }
    }

    #[test]
    fn test_serialization() {
        let input = test_screw();
        let json = serde_json::to_string_pretty(&input).unwrap();
        assert!(json.contains("\"friction_angle\": 10.0"));
        let roundtrip: PowerScrewInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, roundtrip);
    }
}
