//! Rendering Module
//!
//! Draws a sampled function onto a canvas-like surface.

pub mod graph;
pub mod surface;

pub use graph::{GraphRenderer, GraphStyle, RenderSummary};
pub use surface::{parse_hex_color, DrawCommand, RecordingSurface, Surface, SvgSurface};
