//! Application configuration
//!
//! Loaded from an optional JSON file. Every field has a default, so a file
//! only needs the keys it changes:
//!
//! ```json
//! { "playback": { "pacing_ms": 50 }, "canvas": { "width": 1024 } }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::NoteDuration;
use crate::error::{FxError, Result};
use crate::render::parse_hex_color;
use crate::sampling::DEFAULT_STEP;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canvas: CanvasConfig,
    pub sampling: SamplingConfig,
    pub playback: PlaybackConfig,
    pub audio: AudioConfig,
}

/// Drawing surface size and stroke style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub axis_color: String,
    pub curve_color: String,
    pub line_width: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 700.0,
            height: 400.0,
            axis_color: "#3b82f6".to_string(),
            curve_color: "#3b82f6".to_string(),
            line_width: 2.0,
        }
    }
}

/// Graph sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub step: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { step: DEFAULT_STEP }
    }
}

/// Playback stepping and pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// x increment between notes, coarser than the graph step
    pub step: f64,
    /// Delay between notes
    pub pacing_ms: u64,
    /// Length of each note
    pub note: NoteDuration,
    /// Let `stop()` cut the pacing delay short instead of waiting it out
    pub interrupt_pacing: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step: 1.0,
            pacing_ms: 100,
            note: NoteDuration::EIGHTH,
            interrupt_pacing: true,
        }
    }
}

impl PlaybackConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Offline tone rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Quarter notes per minute, for converting note values to seconds
    pub tempo_bpm: f64,
    /// Peak amplitude of a single note
    pub amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            tempo_bpm: 120.0,
            amplitude: 0.3,
        }
    }
}

impl AppConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FxError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(FxError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return invalid("canvas width and height must be positive");
        }
        if !(self.canvas.line_width > 0.0) {
            return invalid("canvas line_width must be positive");
        }
        if parse_hex_color(&self.canvas.axis_color).is_none() {
            return invalid("canvas axis_color must be a hex color");
        }
        if parse_hex_color(&self.canvas.curve_color).is_none() {
            return invalid("canvas curve_color must be a hex color");
        }
        if !(self.sampling.step > 0.0 && self.sampling.step.is_finite()) {
            return invalid("sampling step must be positive");
        }
        if !(self.playback.step > 0.0 && self.playback.step.is_finite()) {
            return invalid("playback step must be positive");
        }
        if self.audio.sample_rate == 0 {
            return invalid("audio sample_rate must be positive");
        }
        if !(self.audio.tempo_bpm > 0.0) {
            return invalid("audio tempo_bpm must be positive");
        }
        if !(0.0..=1.0).contains(&self.audio.amplitude) {
            return invalid("audio amplitude must be within 0..=1");
        }
        Ok(())
    }
}
