//! Tone-producing capability
//!
//! The playback controller never owns a tone engine: the host constructs
//! it, starts or lets the controller start it, and disposes of it when the
//! session ends. The controller only holds a shared handle.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{FxError, Result};

/// Lowest pitch produced by [`pitch_for`] for non-negative values
pub const BASE_PITCH: f64 = 60.0;

/// Width of the pitch band [`pitch_for`] folds values into
pub const PITCH_SPAN: f64 = 20.0;

/// Map a function value to a MIDI-style pitch: `(y mod 20) + 60`.
///
/// The remainder keeps the sign of `y`, so negative values land in
/// `(40, 60]`.
pub fn pitch_for(y: f64) -> f64 {
    (y % PITCH_SPAN) + BASE_PITCH
}

/// Frequency in Hz of a MIDI pitch (A4 = 69 = 440 Hz)
pub fn midi_to_frequency(pitch: f64) -> f64 {
    440.0 * 2.0_f64.powf((pitch - 69.0) / 12.0)
}

/// Note length relative to a whole note, written as `"8n"`, `"4n."`, `"8t"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteDuration {
    /// 1 = whole, 2 = half, 4 = quarter, ...
    pub division: u32,
    pub modifier: NoteModifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteModifier {
    #[default]
    Plain,
    /// One and a half times as long
    Dotted,
    /// Two thirds as long
    Triplet,
}

impl NoteDuration {
    pub const EIGHTH: NoteDuration = NoteDuration {
        division: 8,
        modifier: NoteModifier::Plain,
    };

    /// Length in seconds at `tempo_bpm` quarter notes per minute
    pub fn to_seconds(self, tempo_bpm: f64) -> f64 {
        let whole = 4.0 * 60.0 / tempo_bpm;
        let base = whole / self.division as f64;
        match self.modifier {
            NoteModifier::Plain => base,
            NoteModifier::Dotted => base * 1.5,
            NoteModifier::Triplet => base * 2.0 / 3.0,
        }
    }
}

impl Default for NoteDuration {
    fn default() -> Self {
        Self::EIGHTH
    }
}

impl FromStr for NoteDuration {
    type Err = FxError;

    fn from_str(token: &str) -> Result<Self> {
        let invalid = || FxError::InvalidNoteDuration {
            token: token.to_string(),
        };

        let (body, modifier) = if let Some(body) = token.strip_suffix("n.") {
            (body, NoteModifier::Dotted)
        } else if let Some(body) = token.strip_suffix('n') {
            (body, NoteModifier::Plain)
        } else if let Some(body) = token.strip_suffix('t') {
            (body, NoteModifier::Triplet)
        } else {
            return Err(invalid());
        };

        let division: u32 = body.parse().map_err(|_| invalid())?;
        if division == 0 || !division.is_power_of_two() || division > 64 {
            return Err(invalid());
        }
        Ok(Self { division, modifier })
    }
}

impl TryFrom<String> for NoteDuration {
    type Error = FxError;

    fn try_from(token: String) -> Result<Self> {
        token.parse()
    }
}

impl From<NoteDuration> for String {
    fn from(duration: NoteDuration) -> Self {
        duration.to_string()
    }
}

impl fmt::Display for NoteDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            NoteModifier::Plain => write!(f, "{}n", self.division),
            NoteModifier::Dotted => write!(f, "{}n.", self.division),
            NoteModifier::Triplet => write!(f, "{}t", self.division),
        }
    }
}

/// Something that can sound a pitch for a while
pub trait ToneEngine: Send {
    /// True once started and until disposed
    fn is_ready(&self) -> bool;

    /// Acquire the output. Fails when the platform refuses audio.
    fn start(&mut self) -> Result<()>;

    /// Sound `pitch` (MIDI number, fractional allowed) for `duration`
    fn trigger_attack_release(&mut self, pitch: f64, duration: NoteDuration) -> Result<()>;

    /// Cut the currently sounding note short
    fn trigger_release(&mut self);

    /// Release the output; the engine is unusable until started again
    fn dispose(&mut self);
}

/// Handle through which the controller borrows a host-owned engine
pub type SharedToneEngine = Arc<Mutex<dyn ToneEngine>>;

/// Wrap an engine so it can be handed to a controller while the host
/// keeps its own typed handle.
pub fn share<E: ToneEngine + 'static>(engine: E) -> Arc<Mutex<E>> {
    Arc::new(Mutex::new(engine))
}

pub(crate) fn lock_engine(engine: &SharedToneEngine) -> MutexGuard<'_, dyn ToneEngine + 'static> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test_case(0.0, 60.0)]
    #[test_case(5.0, 65.0)]
    #[test_case(25.0, 65.0 ; "wraps above span")]
    #[test_case(-5.0, 55.0 ; "negative keeps sign")]
    #[test_case(0.5, 60.5 ; "fractional")]
    fn test_pitch_for(y: f64, expected: f64) {
        assert_relative_eq!(pitch_for(y), expected);
    }

    #[test]
    fn test_midi_to_frequency() {
        assert_relative_eq!(midi_to_frequency(69.0), 440.0);
        assert_relative_eq!(midi_to_frequency(81.0), 880.0);
        assert_relative_eq!(midi_to_frequency(60.0), 261.6256, epsilon = 1e-3);
    }

    #[test_case("8n", 0.25)]
    #[test_case("4n", 0.5)]
    #[test_case("1n", 2.0)]
    #[test_case("8n.", 0.375)]
    #[test_case("4t", 1.0 / 3.0)]
    fn test_note_duration_seconds_at_120_bpm(token: &str, expected: f64) {
        let duration: NoteDuration = token.parse().unwrap();
        assert_relative_eq!(duration.to_seconds(120.0), expected);
        assert_eq!(duration.to_string(), token);
    }

    #[test_case("" ; "empty")]
    #[test_case("n" ; "no division")]
    #[test_case("3n" ; "not a power of two")]
    #[test_case("0n" ; "zero")]
    #[test_case("8x" ; "unknown suffix")]
    fn test_note_duration_rejects(token: &str) {
        assert!(token.parse::<NoteDuration>().is_err());
    }

    #[test]
    fn test_note_duration_serde() {
        let json = serde_json::to_string(&NoteDuration::EIGHTH).unwrap();
        assert_eq!(json, "\"8n\"");
        let back: NoteDuration = serde_json::from_str("\"16n.\"").unwrap();
        assert_eq!(back.division, 16);
        assert_eq!(back.modifier, NoteModifier::Dotted);
        assert!(serde_json::from_str::<NoteDuration>("\"7n\"").is_err());
    }
}
