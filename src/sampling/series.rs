//! Lazy (x, y) sample sequences over a scaled domain

use serde::{Deserialize, Serialize};

use crate::expr::FunctionSpec;
use crate::sampling::domain::{Domain, ScaledDomain};
use crate::sampling::scale::ScaleFactor;

/// Step used when sampling for the graph
pub const DEFAULT_STEP: f64 = 0.1;

/// Slack for float error when counting steps, so `[-10, 10]` by `0.1`
/// includes its upper bound.
const STEP_EPSILON: f64 = 1e-9;

/// One sampled point, both coordinates already divided by the scale factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

/// Finite, restartable sequence of samples.
///
/// `x` runs from the scaled lower bound to the scaled upper bound
/// (inclusive) at a fixed step; `y = f(x * scale) / scale`. Cloning the
/// series, or building a new one from the same inputs, replays the same
/// samples.
#[derive(Debug, Clone)]
pub struct SampleSeries<'a> {
    spec: &'a FunctionSpec,
    domain: ScaledDomain,
    step: f64,
    next_index: usize,
    /// Index of the last sample, `None` when the series is empty
    last_index: Option<usize>,
}

impl<'a> SampleSeries<'a> {
    /// Sample `spec` over `domain`, resolving the scale factor from the bounds.
    pub fn generate(spec: &'a FunctionSpec, domain: Domain, step: f64) -> Self {
        Self::with_scale(spec, domain, domain.scale_factor(), step)
    }

    /// Sample with an already-resolved scale factor.
    ///
    /// Consumers that walk the series more than once resolve the scale
    /// once and pass it here so every pass agrees.
    pub fn with_scale(spec: &'a FunctionSpec, domain: Domain, scale: ScaleFactor, step: f64) -> Self {
        let scaled = domain.scaled(scale);
        Self {
            spec,
            domain: scaled,
            step,
            next_index: 0,
            last_index: last_index(scaled.lower, scaled.upper, step),
        }
    }

    /// The scaled domain being walked
    pub fn domain(&self) -> ScaledDomain {
        self.domain
    }

    pub fn scale(&self) -> ScaleFactor {
        self.domain.scale
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// A fresh copy of this series positioned at its first sample
    pub fn restart(&self) -> Self {
        Self {
            next_index: 0,
            ..self.clone()
        }
    }
}

fn last_index(lower: f64, upper: f64, step: f64) -> Option<usize> {
    if !(lower.is_finite() && upper.is_finite() && step.is_finite()) || step <= 0.0 {
        return None;
    }
    if lower > upper {
        return None;
    }
    Some(((upper - lower) / step + STEP_EPSILON).floor() as usize)
}

impl Iterator for SampleSeries<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let last = self.last_index?;
        if self.next_index > last {
            return None;
        }

        // x from the index, not by accumulation, so long series do not drift
        let x = (self.domain.lower + self.next_index as f64 * self.step).min(self.domain.upper);
        self.next_index += 1;

        let scale = self.domain.scale.value();
        let y = self.spec.evaluate(x * scale) / scale;
        Some(Sample { x, y })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.last_index {
            Some(last) if self.next_index <= last => last - self.next_index + 1,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SampleSeries<'_> {}

/// Convenience wrapper around [`SampleSeries::generate`]
pub fn generate(spec: &FunctionSpec, domain: Domain, step: f64) -> SampleSeries<'_> {
    SampleSeries::generate(spec, domain, step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_square_over_default_domain() {
        let spec = FunctionSpec::new("x * x");
        let samples: Vec<Sample> = generate(&spec, Domain::new(-10.0, 10.0), DEFAULT_STEP).collect();

        assert_eq!(samples.len(), 201);
        assert_relative_eq!(samples[0].x, -10.0);
        assert_relative_eq!(samples[100].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(samples[100].y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(samples[200].x, 10.0);
        assert_relative_eq!(samples[200].y, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scaled_domain_divides_x_and_y() {
        let spec = FunctionSpec::new("x");
        let series = generate(&spec, Domain::new(0.0, 1000.0), 1.0);
        assert_eq!(series.scale(), ScaleFactor::Ten);

        let samples: Vec<Sample> = series.collect();
        assert_eq!(samples.len(), 101);
        let last = samples.last().unwrap();
        assert_relative_eq!(last.x, 100.0);
        assert_relative_eq!(last.y, 100.0);
    }

    #[test]
    fn test_inverted_domain_is_empty() {
        let spec = FunctionSpec::new("x");
        let mut series = generate(&spec, Domain::new(5.0, -5.0), DEFAULT_STEP);
        assert_eq!(series.len(), 0);
        assert!(series.next().is_none());
    }

    #[test]
    fn test_zero_width_domain_has_one_sample() {
        let spec = FunctionSpec::new("x + 1");
        let samples: Vec<Sample> = generate(&spec, Domain::new(2.0, 2.0), DEFAULT_STEP).collect();
        assert_eq!(samples, vec![Sample { x: 2.0, y: 3.0 }]);
    }

    #[test]
    fn test_non_positive_step_is_empty() {
        let spec = FunctionSpec::new("x");
        assert_eq!(generate(&spec, Domain::default(), 0.0).count(), 0);
        assert_eq!(generate(&spec, Domain::default(), -1.0).count(), 0);
        assert_eq!(generate(&spec, Domain::default(), f64::NAN).count(), 0);
    }

    #[test]
    fn test_restart_replays_same_samples() {
        let spec = FunctionSpec::new("Math.sin(x)");
        let mut series = generate(&spec, Domain::default(), 0.5);
        let first: Vec<Sample> = series.by_ref().take(5).collect();
        let replay: Vec<Sample> = series.restart().take(5).collect();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_x_values_are_evenly_spaced_and_bounded() {
        let spec = FunctionSpec::new("x");
        let domain = Domain::new(-3.3, 7.77);
        let step = 0.25;
        let xs: Vec<f64> = generate(&spec, domain, step).map(|s| s.x).collect();

        assert!((xs[0] - domain.lower).abs() < step);
        for pair in xs.windows(2) {
            assert!(pair[1] >= pair[0]);
            assert_relative_eq!(pair[1] - pair[0], step, epsilon = 1e-9);
        }
        assert!(*xs.last().unwrap() <= domain.upper);
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let spec = FunctionSpec::new("x");
        let mut series = generate(&spec, Domain::new(0.0, 1.0), 0.5);
        assert_eq!(series.len(), 3);
        series.next();
        assert_eq!(series.len(), 2);
    }
}
