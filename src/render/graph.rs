//! Two-pass graph renderer
//!
//! Pass 1 walks the series for the y range, pass 2 walks it again to plot.
//! Both passes replay the same series, so they share one scale factor.

use serde::Serialize;
use tracing::debug;

use crate::config::CanvasConfig;
use crate::expr::FunctionSpec;
use crate::render::surface::Surface;
use crate::sampling::{Domain, SampleSeries, ScaleFactor};

/// Stroke settings for axes and curve
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStyle {
    pub axis_color: String,
    pub curve_color: String,
    pub line_width: f64,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            axis_color: "#3b82f6".to_string(),
            curve_color: "#3b82f6".to_string(),
            line_width: 2.0,
        }
    }
}

impl From<&CanvasConfig> for GraphStyle {
    fn from(canvas: &CanvasConfig) -> Self {
        Self {
            axis_color: canvas.axis_color.clone(),
            curve_color: canvas.curve_color.clone(),
            line_width: canvas.line_width,
        }
    }
}

/// What a render pass found and drew
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSummary {
    pub scale: ScaleFactor,
    /// `None` when the series was empty
    pub min_y: Option<f64>,
    pub max_y: Option<f64>,
    /// Divisor for the y mapping, at least 1
    pub y_scale: f64,
    /// Half-width of the x mapping, `None` when the curve could not be placed
    pub x_extent: Option<f64>,
    pub points_drawn: usize,
}

/// Draws axes and a function curve onto a [`Surface`]
#[derive(Debug, Clone, Default)]
pub struct GraphRenderer {
    style: GraphStyle,
}

impl GraphRenderer {
    pub fn new(style: GraphStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &GraphStyle {
        &self.style
    }

    /// Sample `spec` over `domain` at `step` and draw it.
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        spec: &FunctionSpec,
        domain: Domain,
        step: f64,
    ) -> RenderSummary {
        let series = SampleSeries::generate(spec, domain, step);
        self.render_series(surface, &series)
    }

    /// Draw an existing series. The series is replayed, not consumed.
    pub fn render_series<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        series: &SampleSeries<'_>,
    ) -> RenderSummary {
        let width = surface.width();
        let height = surface.height();
        let center_x = width / 2.0;
        let center_y = height / 2.0;

        surface.clear_rect(0.0, 0.0, width, height);

        // Pass 1: y range
        let (min_y, max_y) = series
            .restart()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.y), hi.max(s.y))
            });
        let has_samples = min_y <= max_y;
        let y_scale = if has_samples {
            1.0_f64.max(max_y.abs()).max(min_y.abs())
        } else {
            1.0
        };

        self.draw_axes(surface, center_x, center_y);

        let x_extent = x_extent(series);
        let mut points_drawn = 0;

        // Pass 2: plot
        if let Some(extent) = x_extent {
            surface.set_stroke_style(&self.style.curve_color);
            surface.set_line_width(self.style.line_width);
            surface.begin_path();
            for sample in series.restart() {
                let canvas_x = center_x + sample.x * width / (2.0 * extent);
                let canvas_y = center_y - sample.y * height / (2.0 * y_scale);
                if points_drawn == 0 {
                    surface.move_to(canvas_x, canvas_y);
                } else {
                    surface.line_to(canvas_x, canvas_y);
                }
                points_drawn += 1;
            }
            surface.stroke();
        }

        debug!(
            "Rendered {} points (scale {}, y_scale {:.3})",
            points_drawn,
            series.scale(),
            y_scale
        );

        RenderSummary {
            scale: series.scale(),
            min_y: has_samples.then_some(min_y),
            max_y: has_samples.then_some(max_y),
            y_scale,
            x_extent,
            points_drawn,
        }
    }

    fn draw_axes<S: Surface + ?Sized>(&self, surface: &mut S, center_x: f64, center_y: f64) {
        surface.set_stroke_style(&self.style.axis_color);
        surface.set_line_width(self.style.line_width);
        surface.begin_path();
        surface.move_to(0.0, center_y);
        surface.line_to(surface.width(), center_y);
        surface.move_to(center_x, 0.0);
        surface.line_to(center_x, surface.height());
        surface.stroke();
    }
}

/// Half-width used to map x onto the surface.
///
/// The scaled upper bound when it is positive. Otherwise the larger bound
/// magnitude, so a domain ending at or below zero still fits. `None` for
/// an empty series or a domain collapsed onto zero.
fn x_extent(series: &SampleSeries<'_>) -> Option<f64> {
    if series.len() == 0 {
        return None;
    }
    let domain = series.domain();
    if domain.upper > 0.0 {
        return Some(domain.upper);
    }
    let fallback = domain.lower.abs().max(domain.upper.abs());
    (fallback > 0.0).then_some(fallback)
}
