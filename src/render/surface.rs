//! 2D drawing surfaces
//!
//! The renderer only talks to a [`Surface`]: a canvas-like set of stroke
//! primitives. Hosts supply their own; [`SvgSurface`] draws through the
//! `plotters` SVG backend and [`RecordingSurface`] keeps the raw command list.

use std::fs;
use std::path::Path;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tracing::warn;

use crate::error::{FxError, Result};

/// Canvas-style stroke primitives
pub trait Surface {
    fn width(&self) -> f64;

    fn height(&self) -> f64;

    /// Clear a rectangle back to the background
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn set_stroke_style(&mut self, color: &str);

    fn set_line_width(&mut self, width: f64);

    /// Start a new path, discarding the current one
    fn begin_path(&mut self);

    fn move_to(&mut self, x: f64, y: f64);

    fn line_to(&mut self, x: f64, y: f64);

    /// Stroke the current path with the current style and width
    fn stroke(&mut self);
}

/// Parse a `#rgb` or `#rrggbb` hex color
pub fn parse_hex_color(text: &str) -> Option<RGBColor> {
    let hex = text.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, digit) in rgb.iter_mut().zip(hex.chars()) {
                let value = digit.to_digit(16)? as u8;
                *slot = value * 17;
            }
            Some(RGBColor(rgb[0], rgb[1], rgb[2]))
        }
        6 => Some(RGBColor(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

type Point = (i32, i32);

fn to_point(x: f64, y: f64) -> Point {
    (x.round() as i32, y.round() as i32)
}

#[derive(Debug, Clone)]
enum SvgElement {
    Fill {
        corners: [Point; 2],
        color: RGBColor,
    },
    Polyline {
        points: Vec<Point>,
        color: RGBColor,
        width: u32,
    },
}

/// Surface that renders to an SVG document
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    background: RGBColor,
    stroke_style: RGBColor,
    line_width: f64,
    /// Subpaths of the current path, one per `move_to`
    path: Vec<Vec<Point>>,
    elements: Vec<SvgElement>,
}

impl SvgSurface {
    /// Create a surface. An unparseable background falls back to white.
    pub fn new(width: f64, height: f64, background: &str) -> Self {
        let background = parse_hex_color(background).unwrap_or_else(|| {
            warn!("Invalid background color '{}', using white", background);
            WHITE
        });
        Self {
            width,
            height,
            background,
            stroke_style: BLACK,
            line_width: 1.0,
            path: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Number of stroked polylines and cleared regions drawn so far
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn pixel_size(&self) -> (u32, u32) {
        (self.width.max(1.0).round() as u32, self.height.max(1.0).round() as u32)
    }

    fn draw_on<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&self.background).map_err(render_error)?;
        for element in &self.elements {
            let drawn = match element {
                SvgElement::Fill { corners, color } => {
                    root.draw(&Rectangle::new(*corners, color.filled()))
                }
                SvgElement::Polyline {
                    points,
                    color,
                    width,
                } => root.draw(&PathElement::new(points.clone(), color.stroke_width(*width))),
            };
            drawn.map_err(render_error)?;
        }
        Ok(())
    }

    /// Serialise everything drawn so far
    pub fn to_svg(&self) -> Result<String> {
        let mut document = String::new();
        {
            let root = SVGBackend::with_string(&mut document, self.pixel_size()).into_drawing_area();
            self.draw_on(&root)?;
            root.present().map_err(render_error)?;
        }
        Ok(document)
    }

    /// Write the SVG document to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(FxError::FileNotFound {
                    path: parent.to_path_buf(),
                });
            }
        }
        fs::write(path, self.to_svg()?)?;
        Ok(())
    }
}

fn render_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> FxError {
    FxError::Render {
        reason: err.to_string(),
    }
}

impl Surface for SvgSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let covers_all = x <= 0.0 && y <= 0.0 && x + width >= self.width && y + height >= self.height;
        if covers_all {
            self.elements.clear();
        } else {
            self.elements.push(SvgElement::Fill {
                corners: [to_point(x, y), to_point(x + width, y + height)],
                color: self.background,
            });
        }
    }

    fn set_stroke_style(&mut self, color: &str) {
        match parse_hex_color(color) {
            Some(parsed) => self.stroke_style = parsed,
            None => warn!("Ignoring invalid stroke color '{}'", color),
        }
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(vec![to_point(x, y)]);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        match self.path.last_mut() {
            Some(subpath) => subpath.push(to_point(x, y)),
            // A line with no start point begins a subpath there
            None => self.path.push(vec![to_point(x, y)]),
        }
    }

    fn stroke(&mut self) {
        let width = self.line_width.round().max(1.0) as u32;
        for subpath in self.path.iter().filter(|p| p.len() > 1) {
            self.elements.push(SvgElement::Polyline {
                points: subpath.clone(),
                color: self.stroke_style,
                width,
            });
        }
    }
}

/// A single drawing primitive, as recorded by [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    StrokeStyle(String),
    LineWidth(f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Stroke,
}

/// Surface that records every call
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Points of every `LineTo` issued, in order
    pub fn line_points(&self) -> Vec<(f64, f64)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::LineTo(x, y) => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    pub fn stroke_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke))
            .count()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::ClearRect {
            x,
            y,
            width,
            height,
        });
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.commands.push(DrawCommand::StrokeStyle(color.to_string()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::LineTo(x, y));
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#3b82f6"), Some(RGBColor(0x3b, 0x82, 0xf6)));
        assert_eq!(parse_hex_color("#fff"), Some(RGBColor(255, 255, 255)));
        assert_eq!(parse_hex_color("3b82f6"), None);
        assert_eq!(parse_hex_color("#3b82f"), None);
        assert_eq!(parse_hex_color("red\" onload=\"x"), None);
    }

    #[test]
    fn test_svg_surface_strokes_path() {
        let mut svg = SvgSurface::new(100.0, 50.0, "#ffffff");
        svg.set_stroke_style("#3b82f6");
        svg.set_line_width(2.0);
        svg.begin_path();
        svg.move_to(0.0, 25.0);
        svg.line_to(100.0, 25.0);
        svg.stroke();
        assert_eq!(svg.element_count(), 1);

        let doc = svg.to_svg().unwrap().to_lowercase();
        assert!(doc.contains("<svg"));
        assert!(doc.contains("<polyline"));
        assert!(doc.contains("#3b82f6"));
        assert!(doc.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_svg_each_subpath_is_its_own_polyline() {
        let mut svg = SvgSurface::new(10.0, 10.0, "#000");
        svg.begin_path();
        svg.move_to(0.0, 5.0);
        svg.line_to(10.0, 5.0);
        svg.move_to(5.0, 0.0);
        svg.line_to(5.0, 10.0);
        svg.stroke();
        assert_eq!(svg.element_count(), 2);
    }

    #[test]
    fn test_svg_invalid_colors_never_reach_document() {
        let mut svg = SvgSurface::new(10.0, 10.0, "red\" onload=\"x");
        svg.set_stroke_style("#00ff00");
        svg.set_stroke_style("blue\" onclick=\"y");
        svg.begin_path();
        svg.move_to(0.0, 0.0);
        svg.line_to(10.0, 10.0);
        svg.stroke();

        let doc = svg.to_svg().unwrap().to_lowercase();
        assert!(!doc.contains("onload"));
        assert!(!doc.contains("onclick"));
        assert!(doc.contains("#00ff00"));
        assert!(doc.contains("#ffffff"));
    }

    #[test]
    fn test_svg_full_clear_drops_elements() {
        let mut svg = SvgSurface::new(10.0, 10.0, "#000");
        svg.begin_path();
        svg.move_to(0.0, 0.0);
        svg.line_to(1.0, 1.0);
        svg.stroke();
        assert_eq!(svg.element_count(), 1);

        svg.clear_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(svg.element_count(), 0);

        svg.clear_rect(2.0, 2.0, 3.0, 3.0);
        assert_eq!(svg.element_count(), 1);
    }

    #[test]
    fn test_svg_empty_path_not_stroked() {
        let mut svg = SvgSurface::new(10.0, 10.0, "#000");
        svg.begin_path();
        svg.stroke();
        svg.move_to(1.0, 1.0);
        svg.stroke();
        assert_eq!(svg.element_count(), 0);
    }

    #[test]
    fn test_svg_save_to_missing_directory_fails() {
        let svg = SvgSurface::new(10.0, 10.0, "#000");
        let err = svg
            .save(Path::new("/definitely/not/here/graph.svg"))
            .unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_svg_save_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.svg");
        SvgSurface::new(20.0, 10.0, "#111827").save(&path).unwrap();

        let doc = fs::read_to_string(&path).unwrap().to_lowercase();
        assert!(doc.contains("#111827"));
    }

    #[test]
    fn test_recording_surface_collects_line_points() {
        let mut rec = RecordingSurface::new(10.0, 10.0);
        rec.begin_path();
        rec.move_to(0.0, 0.0);
        rec.line_to(1.0, 2.0);
        rec.line_to(3.0, 4.0);
        rec.stroke();
        assert_eq!(rec.line_points(), vec![(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(rec.stroke_count(), 1);
    }
}
