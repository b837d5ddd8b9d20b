//! Magnitude-based scale factors
//!
//! Huge domains are divided down by a power of ten so sampled x values and
//! evaluated y values stay within a few hundred units.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Power-of-ten divisor applied to a domain and its values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ScaleFactor {
    #[default]
    One,
    Ten,
    Hundred,
    Thousand,
}

impl ScaleFactor {
    /// Numeric divisor
    pub fn value(self) -> f64 {
        match self {
            ScaleFactor::One => 1.0,
            ScaleFactor::Ten => 10.0,
            ScaleFactor::Hundred => 100.0,
            ScaleFactor::Thousand => 1000.0,
        }
    }

    /// Effective factor for a pair of bounds: the larger of the two.
    pub fn for_bounds(lower: f64, upper: f64) -> Self {
        resolve(lower).max(resolve(upper))
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Scale factor for a single bound, from `|value|`:
/// `> 50000 -> 1000`, `> 5000 -> 100`, `> 500 -> 10`, else `1`.
///
/// NaN resolves to `One`.
pub fn resolve(value: f64) -> ScaleFactor {
    let magnitude = value.abs();
    if magnitude > 50_000.0 {
        ScaleFactor::Thousand
    } else if magnitude > 5_000.0 {
        ScaleFactor::Hundred
    } else if magnitude > 500.0 {
        ScaleFactor::Ten
    } else {
        ScaleFactor::One
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0.0, ScaleFactor::One)]
    #[test_case(500.0, ScaleFactor::One)]
    #[test_case(501.0, ScaleFactor::Ten)]
    #[test_case(5000.0, ScaleFactor::Ten)]
    #[test_case(5001.0, ScaleFactor::Hundred)]
    #[test_case(50000.0, ScaleFactor::Hundred)]
    #[test_case(50001.0, ScaleFactor::Thousand)]
    #[test_case(-50001.0, ScaleFactor::Thousand ; "negative uses magnitude")]
    #[test_case(f64::INFINITY, ScaleFactor::Thousand ; "infinity")]
    #[test_case(f64::NAN, ScaleFactor::One ; "nan")]
    fn test_resolve_thresholds(value: f64, expected: ScaleFactor) {
        assert_eq!(resolve(value), expected);
    }

    #[test]
    fn test_resolve_is_monotonic() {
        let mut previous = ScaleFactor::One;
        let mut value = 0.0;
        while value < 200_000.0 {
            let current = resolve(value);
            assert!(current >= previous, "resolve not monotonic at {}", value);
            previous = current;
            value += 250.0;
        }
    }

    #[test]
    fn test_resolve_is_stable_on_its_own_output() {
        for value in [1.0, 501.0, 5001.0, 50001.0] {
            let factor = resolve(value);
            assert_eq!(resolve(factor.value()), ScaleFactor::One);
            assert_eq!(resolve(resolve(factor.value()).value()), ScaleFactor::One);
        }
    }

    #[test]
    fn test_for_bounds_takes_maximum() {
        assert_eq!(ScaleFactor::for_bounds(-10.0, 10.0), ScaleFactor::One);
        assert_eq!(ScaleFactor::for_bounds(-600.0, 10.0), ScaleFactor::Ten);
        assert_eq!(ScaleFactor::for_bounds(0.0, 100_000.0), ScaleFactor::Thousand);
    }

    #[test]
    fn test_display() {
        assert_eq!(ScaleFactor::Hundred.to_string(), "100");
    }
}
