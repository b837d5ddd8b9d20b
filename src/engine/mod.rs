//! Audio Engine Module
//!
//! Sonification of a sampled function:
//! - Tone engine capability and pitch mapping
//! - Offline WAV tone engine
//! - Playback state machine (play / stop / resume / reset)

pub mod playback;
pub mod tone;
pub mod wav;

pub use playback::{
    PlaybackController, PlaybackOutcome, PlaybackSettings, PlaybackState, PlaybackStatus,
};
pub use tone::{
    midi_to_frequency, pitch_for, share, NoteDuration, NoteModifier, SharedToneEngine, ToneEngine,
};
pub use wav::{NoteEvent, WavToneEngine};
