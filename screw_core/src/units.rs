//! # Unit Types
//!
//! Type-safe wrappers for angles. Friction angles arrive from input tables in
//! degrees while every trigonometric call works in radians; keeping the two in
//! separate newtypes makes the conversion explicit at the one place it happens.
//!
//! Lengths, loads and stresses stay plain `f64`: the engine is unit-agnostic and
//! reports results in whatever consistent unit system the table uses
//! (e.g. mm and N give N·mm torques and N/mm² stresses).
//!
//! ## Example
//!
//! ```rust
//! use screw_core::units::{Degrees, Radians};
//!
//! let friction = Degrees(180.0);
//! let rad: Radians = friction.into();
//! assert!((rad.0 - std::f64::consts::PI).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0.to_radians())
    }
}

impl From<Radians> for Degrees {
    fn from(rad: Radians) -> Self {
        Degrees(rad.0.to_degrees())
    }
}

impl Radians {
    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    pub fn cos(self) -> f64 {
        self.0.cos()
    }

    pub fn tan(self) -> f64 {
        self.0.tan()
    }

    /// Angle whose tangent is `ratio`
    pub fn atan(ratio: f64) -> Self {
        Radians(ratio.atan())
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Degrees);
impl_arithmetic!(Radians);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_to_radians() {
        let rad: Radians = Degrees(90.0).into();
        assert!((rad.0 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_radians_to_degrees() {
        let deg: Degrees = Radians(std::f64::consts::FRAC_PI_4).into();
        assert!((deg.0 - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_arithmetic() {
        let a = Radians(0.5);
        let b = Radians(0.25);
        assert_eq!((a + b).0, 0.75);
        assert_eq!((a - b).0, 0.25);
        assert!(a > b);
    }

    #[test]
    fn test_serialization() {
        let friction = Degrees(10.5);
        let json = serde_json::to_string(&friction).unwrap();
        assert_eq!(json, "10.5");

        let roundtrip: Degrees = serde_json::from_str(&json).unwrap();
        assert_eq!(friction, roundtrip);
    }
}
