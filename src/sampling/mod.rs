//! Sampling Module
//!
//! Shared by the graph renderer and the playback controller:
//! - Scale factor resolution from domain bounds
//! - Domain and scaled domain types
//! - Lazy sample series at a fixed step

pub mod domain;
pub mod scale;
pub mod series;

pub use domain::{Domain, ScaledDomain, DEFAULT_LOWER, DEFAULT_UPPER};
pub use scale::{resolve, ScaleFactor};
pub use series::{generate, Sample, SampleSeries, DEFAULT_STEP};
