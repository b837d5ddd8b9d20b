//! Offline tone engine
//!
//! Records every triggered note against the engine's clock and renders the
//! result to a mono WAV file. Used by the CLI in place of a live synth.
//!
//! Notes are sine tones with a short linear attack and release so that
//! back-to-back pitches do not click.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tokio::time::Instant;
use tracing::debug;

use crate::config::AudioConfig;
use crate::engine::tone::{midi_to_frequency, NoteDuration, ToneEngine};
use crate::error::{FxError, Result};

const ATTACK_SECS: f64 = 0.005;
const RELEASE_SECS: f64 = 0.02;

/// A note as triggered, in seconds on the engine timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub onset_secs: f64,
    pub pitch: f64,
    pub duration_secs: f64,
}

/// Tone engine that renders to a sample buffer
#[derive(Debug, Clone)]
pub struct WavToneEngine {
    sample_rate: u32,
    tempo_bpm: f64,
    amplitude: f32,
    started_at: Option<Instant>,
    /// Timeline position the current session started from
    offset_secs: f64,
    notes: Vec<NoteEvent>,
}

impl WavToneEngine {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            tempo_bpm: config.tempo_bpm,
            amplitude: config.amplitude,
            started_at: None,
            offset_secs: 0.0,
            notes: Vec::new(),
        }
    }

    /// Every note triggered so far.
    ///
    /// Disposing and restarting continues the same timeline, so onsets
    /// never go backwards.
    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn elapsed_secs(&self) -> f64 {
        self.offset_secs
            + self
                .started_at
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0)
    }

    /// End of the last note on the timeline
    fn end_secs(&self) -> f64 {
        self.notes
            .iter()
            .map(|n| n.onset_secs + n.duration_secs)
            .fold(0.0_f64, f64::max)
    }

    /// Mix all notes into a mono buffer
    pub fn render(&self) -> Vec<f32> {
        let end_secs = self.end_secs();
        let sample_rate = self.sample_rate as f64;
        let mut samples = vec![0.0_f32; (end_secs * sample_rate).ceil() as usize];

        for note in &self.notes {
            let start = (note.onset_secs * sample_rate) as usize;
            let length = (note.duration_secs * sample_rate) as usize;
            let angular_freq = 2.0 * std::f64::consts::PI * midi_to_frequency(note.pitch) / sample_rate;

            for (i, sample) in samples.iter_mut().skip(start).take(length).enumerate() {
                let t = i as f64 / sample_rate;
                let envelope = envelope(t, note.duration_secs);
                *sample += self.amplitude * (envelope * (angular_freq * i as f64).sin()) as f32;
            }
        }

        for sample in samples.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
        samples
    }

    /// Render and write a 16-bit mono WAV file
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(FxError::FileNotFound {
                    path: parent.to_path_buf(),
                });
            }
        }

        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)?;
        for sample in self.render() {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(scaled)?;
        }
        writer.finalize()?;

        debug!("Wrote {} notes to {}", self.notes.len(), path.display());
        Ok(())
    }
}

fn envelope(t: f64, duration: f64) -> f64 {
    let attack = (t / ATTACK_SECS).min(1.0);
    let release = ((duration - t) / RELEASE_SECS).clamp(0.0, 1.0);
    attack.min(release)
}

impl ToneEngine for WavToneEngine {
    fn is_ready(&self) -> bool {
        self.started_at.is_some()
    }

    fn start(&mut self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(FxError::ToneEngineUnavailable {
                reason: "sample rate is zero".to_string(),
            });
        }
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
            debug!("Tone engine started at {} Hz", self.sample_rate);
        }
        Ok(())
    }

    fn trigger_attack_release(&mut self, pitch: f64, duration: NoteDuration) -> Result<()> {
        if !self.is_ready() {
            return Err(FxError::ToneEngineUnavailable {
                reason: "tone engine not started".to_string(),
            });
        }
        if !pitch.is_finite() {
            return Err(FxError::ToneEngineFault {
                reason: format!("cannot sound pitch {}", pitch),
            });
        }
        self.notes.push(NoteEvent {
            onset_secs: self.elapsed_secs(),
            pitch,
            duration_secs: duration.to_seconds(self.tempo_bpm),
        });
        Ok(())
    }

    fn trigger_release(&mut self) {
        let now = self.elapsed_secs();
        if let Some(note) = self.notes.last_mut() {
            let sounding_for = now - note.onset_secs;
            if sounding_for < note.duration_secs {
                note.duration_secs = sounding_for.max(0.0);
            }
        }
    }

    fn dispose(&mut self) {
        self.offset_secs = self.elapsed_secs().max(self.end_secs());
        self.started_at = None;
        debug!("Tone engine disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn engine() -> WavToneEngine {
        WavToneEngine::new(&AudioConfig::default())
    }

    #[test]
    fn test_not_ready_until_started() {
        let mut engine = engine();
        assert!(!engine.is_ready());
        assert!(engine
            .trigger_attack_release(60.0, NoteDuration::EIGHTH)
            .is_err());

        engine.start().unwrap();
        assert!(engine.is_ready());
        engine.dispose();
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_zero_sample_rate_cannot_start() {
        let mut engine = WavToneEngine::new(&AudioConfig {
            sample_rate: 0,
            ..AudioConfig::default()
        });
        assert!(matches!(
            engine.start(),
            Err(FxError::ToneEngineUnavailable { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_notes_recorded_at_elapsed_time() {
        let mut engine = engine();
        engine.start().unwrap();
        engine
            .trigger_attack_release(60.0, NoteDuration::EIGHTH)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        engine
            .trigger_attack_release(72.0, NoteDuration::EIGHTH)
            .unwrap();

        let notes = engine.notes();
        assert_eq!(notes.len(), 2);
        assert_relative_eq!(notes[0].onset_secs, 0.0);
        assert_relative_eq!(notes[1].onset_secs, 0.1, epsilon = 2e-3);
        assert_relative_eq!(notes[1].duration_secs, 0.25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_truncates_sounding_note() {
        let mut engine = engine();
        engine.start().unwrap();
        engine
            .trigger_attack_release(60.0, NoteDuration::EIGHTH)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.trigger_release();
        assert_relative_eq!(engine.notes()[0].duration_secs, 0.05, epsilon = 2e-3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_continues_timeline() {
        let mut engine = engine();
        engine.start().unwrap();
        engine
            .trigger_attack_release(60.0, NoteDuration::EIGHTH)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        engine.dispose();

        engine.start().unwrap();
        engine
            .trigger_attack_release(64.0, NoteDuration::EIGHTH)
            .unwrap();

        let notes = engine.notes();
        assert_eq!(notes.len(), 2);
        assert_relative_eq!(notes[1].onset_secs, 1.0, epsilon = 2e-3);
        assert!(notes[1].onset_secs >= notes[0].onset_secs + notes[0].duration_secs);
    }

    #[test]
    fn test_quick_restart_does_not_overlap_sounding_note() {
        let mut engine = engine();
        engine.start().unwrap();
        engine
            .trigger_attack_release(60.0, NoteDuration::EIGHTH)
            .unwrap();
        engine.dispose();
        engine.start().unwrap();
        engine
            .trigger_attack_release(64.0, NoteDuration::EIGHTH)
            .unwrap();

        let notes = engine.notes();
        assert!(notes[1].onset_secs >= notes[0].onset_secs + notes[0].duration_secs);
    }

    #[test]
    fn test_non_finite_pitch_is_fault() {
        let mut engine = engine();
        engine.start().unwrap();
        assert!(matches!(
            engine.trigger_attack_release(f64::NAN, NoteDuration::EIGHTH),
            Err(FxError::ToneEngineFault { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_length_and_bounds() {
        let mut engine = engine();
        engine.start().unwrap();
        engine
            .trigger_attack_release(69.0, NoteDuration::EIGHTH)
            .unwrap();
        let samples = engine.render();
        // 0.25s at 48kHz
        assert_eq!(samples.len(), 12_000);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        assert!(samples.iter().any(|s| s.abs() > 0.1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tones.wav");

        let mut engine = engine();
        engine.start().unwrap();
        engine
            .trigger_attack_release(64.0, NoteDuration::EIGHTH)
            .unwrap();
        engine.write_wav(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 48_000);
        assert_eq!(reader.len(), 12_000);
    }
}
