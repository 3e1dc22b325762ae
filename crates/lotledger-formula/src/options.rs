//! Formula engine options

use std::fmt;
use std::str::FromStr;

use crate::parser::DEFAULT_MAX_DEPTH;

/// How results are rounded to [`FormulaOptions::decimal_places`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RoundingMode {
    /// Ties round toward positive infinity (2.5 -> 3, -2.5 -> -2)
    #[default]
    HalfUp,
    /// Ties round to the even neighbour (2.5 -> 2, 3.5 -> 4)
    HalfEven,
}

impl RoundingMode {
    /// Round `value` to `places` decimal places
    ///
    /// Values whose scaled form is not finite are returned unchanged.
    pub fn round(self, value: f64, places: u32) -> f64 {
        let factor = 10f64.powi(places as i32);
        let scaled = value * factor;
        if !scaled.is_finite() {
            return value;
        }

        let rounded = match self {
            RoundingMode::HalfUp => {
                // round() breaks ties away from zero; negative ties go up instead
                let nearest = scaled.round();
                if nearest - scaled == -0.5 {
                    nearest + 1.0
                } else {
                    nearest
                }
            }
            RoundingMode::HalfEven => {
                let floor = scaled.floor();
                let diff = scaled - floor;
                if diff > 0.5 || (diff == 0.5 && floor % 2.0 != 0.0) {
                    floor + 1.0
                } else {
                    floor
                }
            }
        };

        let result = rounded / factor;
        // Avoid displaying "-0"
        if result == 0.0 {
            0.0
        } else {
            result
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::HalfUp => f.write_str("half-up"),
            RoundingMode::HalfEven => f.write_str("half-even"),
        }
    }
}

impl FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "half-up" | "up" => Ok(RoundingMode::HalfUp),
            "half-even" | "even" | "bankers" => Ok(RoundingMode::HalfEven),
            other => Err(format!("Unknown rounding mode: {}", other)),
        }
    }
}

/// Options for formula validation and evaluation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FormulaOptions {
    /// Decimal places numeric results are rounded to (default: 2)
    pub decimal_places: u32,
    /// Tie-breaking rule for rounding (default: half-up)
    pub rounding: RoundingMode,
    /// Maximum formula length in characters (default: 4096)
    pub max_length: usize,
    /// Maximum nesting of parentheses and prefix signs (default: 64)
    pub max_depth: usize,
}

impl Default for FormulaOptions {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            rounding: RoundingMode::HalfUp,
            max_length: 4096,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        let mode = RoundingMode::HalfUp;
        assert_eq!(mode.round(10.0 / 3.0, 2), 3.33);
        assert_eq!(mode.round(2.0 / 3.0, 2), 0.67);
        assert_eq!(mode.round(0.125, 2), 0.13);
        assert_eq!(mode.round(-0.125, 2), -0.12);
        assert_eq!(mode.round(2.5, 0), 3.0);
        assert_eq!(mode.round(-2.5, 0), -2.0);
    }

    #[test]
    fn test_round_half_even() {
        let mode = RoundingMode::HalfEven;
        assert_eq!(mode.round(0.125, 2), 0.12);
        assert_eq!(mode.round(0.375, 2), 0.38);
        assert_eq!(mode.round(2.5, 0), 2.0);
        assert_eq!(mode.round(3.5, 0), 4.0);
        assert_eq!(mode.round(-2.5, 0), -2.0);
    }

    #[test]
    fn test_round_negative_zero() {
        assert!(RoundingMode::HalfEven.round(-0.001, 2).is_sign_positive());
        assert!(RoundingMode::HalfUp.round(-0.0, 2).is_sign_positive());
    }

    #[test]
    fn test_round_large_magnitudes() {
        // Scaled past 2^52, where adding 0.5 is no longer exact
        assert_eq!(RoundingMode::HalfUp.round(45035996273704.97, 2), 45035996273704.97);
        assert_eq!(RoundingMode::HalfUp.round(-45035996273704.97, 2), -45035996273704.97);
        assert_eq!(RoundingMode::HalfEven.round(45035996273704.97, 2), 45035996273704.97);
        assert_eq!(RoundingMode::HalfUp.round(9007199254740993.0, 0), 9007199254740993.0);
    }

    #[test]
    fn test_round_keeps_huge_values() {
        assert_eq!(RoundingMode::HalfUp.round(f64::MAX, 2), f64::MAX);
    }

    #[test]
    fn test_parse_rounding_mode() {
        assert_eq!("half-even".parse::<RoundingMode>(), Ok(RoundingMode::HalfEven));
        assert_eq!("UP".parse::<RoundingMode>(), Ok(RoundingMode::HalfUp));
        assert!("nearest".parse::<RoundingMode>().is_err());
    }
}
