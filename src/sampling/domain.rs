//! Sampling domain

use serde::{Deserialize, Serialize};

use crate::sampling::scale::ScaleFactor;

/// Default lower bound for a fresh session
pub const DEFAULT_LOWER: f64 = -10.0;
/// Default upper bound for a fresh session
pub const DEFAULT_UPPER: f64 = 10.0;

/// The `[lower, upper]` x-range a function is sampled over.
///
/// No ordering is enforced; `lower > upper` simply samples nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub lower: f64,
    pub upper: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self::new(DEFAULT_LOWER, DEFAULT_UPPER)
    }
}

impl Domain {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Domain used for the collatz sequence
    pub fn collatz() -> Self {
        Self::new(0.0, 100.0)
    }

    /// Effective scale factor for this domain
    pub fn scale_factor(&self) -> ScaleFactor {
        ScaleFactor::for_bounds(self.lower, self.upper)
    }

    /// Bounds divided by `scale`
    pub fn scaled(&self, scale: ScaleFactor) -> ScaledDomain {
        ScaledDomain {
            lower: self.lower / scale.value(),
            upper: self.upper / scale.value(),
            scale,
        }
    }

    /// Bounds divided by this domain's own scale factor
    pub fn adjusted(&self) -> ScaledDomain {
        self.scaled(self.scale_factor())
    }

    /// True when sampling this domain yields nothing
    pub fn is_inverted(&self) -> bool {
        self.lower > self.upper
    }
}

/// A domain after division by its scale factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledDomain {
    pub lower: f64,
    pub upper: f64,
    pub scale: ScaleFactor,
}

impl ScaledDomain {
    /// Clamp a position into `[lower, upper]`.
    ///
    /// Written as max-then-min so an inverted domain yields `lower`,
    /// which lies past `upper` and therefore plays nothing.
    pub fn clamp(&self, position: f64) -> f64 {
        self.lower.max(position.min(self.upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_domain() {
        assert_eq!(Domain::default(), Domain::new(-10.0, 10.0));
    }

    #[test]
    fn test_adjusted_divides_by_scale() {
        let adjusted = Domain::new(-1000.0, 100_000.0).adjusted();
        assert_eq!(adjusted.scale, ScaleFactor::Thousand);
        assert_relative_eq!(adjusted.lower, -1.0);
        assert_relative_eq!(adjusted.upper, 100.0);
    }

    #[test]
    fn test_clamp() {
        let adjusted = Domain::new(-10.0, 10.0).adjusted();
        assert_eq!(adjusted.clamp(3.0), 3.0);
        assert_eq!(adjusted.clamp(-20.0), -10.0);
        assert_eq!(adjusted.clamp(20.0), 10.0);
    }

    #[test]
    fn test_clamp_inverted_domain_returns_lower() {
        let adjusted = Domain::new(5.0, -5.0).adjusted();
        assert_eq!(adjusted.clamp(0.0), 5.0);
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&Domain::collatz()).unwrap();
        assert_eq!(json, r#"{"lower":0.0,"upper":100.0}"#);
    }
}
