//! Fxtone - Function Graphing and Sonification
//!
//! Fxtone takes a user-defined function f(x), draws it over a domain and
//! turns it into a sequence of pitches.
//!
//! # Architecture
//!
//! Both outputs share one sampling engine:
//! - `expr`: sandboxed expression parser and fail-soft evaluator
//! - `sampling`: scale factor resolution and lazy sample series
//! - `render`: two-pass graph renderer over a drawing surface
//! - `engine`: tone engines and the resumable playback controller
//! - `state`: session state and persisted preferences

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod render;
pub mod sampling;
pub mod state;

pub use error::{FxError, Result};
