//! Playback State Machine for Fxtone
//!
//! Steps through a function's domain, sounding one note per step and
//! pacing itself with a fixed delay. Playback can be stopped and resumed
//! from the last note played.
//!
//! ```text
//!            play()                 stop()
//!   Idle ──────────────▶ Playing ──────────────▶ Stopped
//!    ▲                    │  ▲                     │
//!    │  completion/fault  │  └──────── play() ─────┘
//!    └────────────────────┘
//! ```
//!
//! `reset()` returns to `Idle` from any state and forgets the resume point.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PlaybackConfig;
use crate::engine::tone::{lock_engine, pitch_for, NoteDuration, SharedToneEngine};
use crate::error::Result;
use crate::expr::FunctionSpec;
use crate::sampling::Domain;
use crate::state::Session;

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PlaybackStatus {
    /// Nothing playing, no resume point pending (default state)
    #[default]
    Idle,
    /// A run is stepping through the domain
    Playing,
    /// Stopped by the user; the next play resumes
    Stopped,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "Idle"),
            PlaybackStatus::Playing => write!(f, "Playing"),
            PlaybackStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Snapshot of the controller's state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// Last x played, in scaled-domain units. Kept across `stop()`,
    /// cleared on completion and on reset.
    pub last_position: Option<f64>,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}

/// How a call to [`PlaybackController::play`] ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlaybackOutcome {
    /// Ran to the upper bound
    Completed { notes: usize },
    /// Cancelled by `stop()` or `reset()`
    Stopped { notes: usize, at: Option<f64> },
    /// Another run is active; this call did nothing
    AlreadyPlaying,
    /// No tone engine, or it refused to start; this call did nothing
    Unavailable,
    /// The tone engine failed mid-run; the controller is idle again
    Faulted { notes: usize },
}

/// Step, pacing and note settings for a run
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    pub step: f64,
    pub pacing: Duration,
    pub note: NoteDuration,
    pub interrupt_pacing: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

impl From<&PlaybackConfig> for PlaybackSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            step: config.step,
            pacing: config.pacing(),
            note: config.note,
            interrupt_pacing: config.interrupt_pacing,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: PlaybackState,
    /// Token of the active run
    cancel: Option<CancellationToken>,
}

/// Drives sonification of a function, one note per step
///
/// All methods take `&self`: a host awaits [`play`](Self::play) while
/// calling [`stop`](Self::stop) from another branch of the same task.
/// Only one run is active at a time.
pub struct PlaybackController {
    settings: PlaybackSettings,
    tone: Option<SharedToneEngine>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("settings", &self.settings)
            .field("has_tone_engine", &self.tone.is_some())
            .field("state", &self.state())
            .finish()
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(PlaybackSettings::default())
    }
}

impl PlaybackController {
    /// Create a controller with no tone engine attached
    ///
    /// # Example
    /// ```
    /// use fxtone::engine::{PlaybackController, PlaybackSettings, PlaybackStatus};
    /// let controller = PlaybackController::new(PlaybackSettings::default());
    /// assert_eq!(controller.state().status, PlaybackStatus::Idle);
    /// assert_eq!(controller.last_position(), None);
    /// ```
    pub fn new(settings: PlaybackSettings) -> Self {
        Self {
            settings,
            tone: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Attach the host's tone engine
    pub fn with_tone_engine(mut self, tone: SharedToneEngine) -> Self {
        self.tone = Some(tone);
        self
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.lock().state.status
    }

    pub fn is_playing(&self) -> bool {
        self.lock().state.is_playing()
    }

    pub fn last_position(&self) -> Option<f64> {
        self.lock().state.last_position
    }

    // ========================================================================
    // Transport Controls
    // ========================================================================

    /// Play `spec` over `domain`, resuming from the last position if a
    /// previous run was stopped.
    ///
    /// x advances from the resume point (or the scaled lower bound) to the
    /// scaled upper bound by the playback step. Each step sounds
    /// `pitch_for(f(x))`, records x as the last position, then waits out
    /// the pacing interval. Never returns an error: problems are logged and
    /// reported through the outcome.
    pub async fn play(&self, spec: &FunctionSpec, domain: Domain) -> PlaybackOutcome {
        let (token, tone, resume_from) = {
            let mut inner = self.lock();
            if inner.state.is_playing() {
                debug!("[PLAYBACK] Already playing");
                return PlaybackOutcome::AlreadyPlaying;
            }

            let Some(tone) = self.tone.clone() else {
                warn!("[PLAYBACK] No tone engine available, ignoring play");
                return PlaybackOutcome::Unavailable;
            };

            {
                let mut engine = lock_engine(&tone);
                if !engine.is_ready() {
                    if let Err(e) = engine.start() {
                        warn!("[PLAYBACK] Tone engine could not start: {}", e);
                        return PlaybackOutcome::Unavailable;
                    }
                }
            }

            let token = CancellationToken::new();
            inner.cancel = Some(token.clone());
            inner.state.status = PlaybackStatus::Playing;
            (token, tone, inner.state.last_position)
        };

        let adjusted = domain.adjusted();
        let start = adjusted.clamp(resume_from.unwrap_or(adjusted.lower));
        info!(
            "[PLAYBACK] Play '{}' from {} to {} (scale {})",
            spec.expression_text(),
            start,
            adjusted.upper,
            adjusted.scale
        );

        let mut notes = 0;
        let run = self
            .run_steps(spec, start, adjusted.upper, &tone, &token, &mut notes)
            .await;

        let mut inner = self.lock();
        match run {
            Err(e) => {
                if e.is_recoverable() {
                    warn!("[PLAYBACK] Playback interrupted, engine can be restarted: {}", e);
                } else {
                    error!("[PLAYBACK] Error during audio playback: {}", e);
                }
                if !token.is_cancelled() {
                    inner.state.status = PlaybackStatus::Idle;
                    inner.cancel = None;
                }
                PlaybackOutcome::Faulted { notes }
            }
            Ok(()) if token.is_cancelled() => {
                // stop()/reset() already settled the state
                debug!("[PLAYBACK] Stopped after {} notes", notes);
                PlaybackOutcome::Stopped {
                    notes,
                    at: inner.state.last_position,
                }
            }
            Ok(()) => {
                inner.state.status = PlaybackStatus::Idle;
                inner.state.last_position = None;
                inner.cancel = None;
                info!("[PLAYBACK] Completed after {} notes", notes);
                PlaybackOutcome::Completed { notes }
            }
        }
    }

    async fn run_steps(
        &self,
        spec: &FunctionSpec,
        start: f64,
        upper: f64,
        tone: &SharedToneEngine,
        token: &CancellationToken,
        notes: &mut usize,
    ) -> Result<()> {
        let mut index = 0_u64;
        loop {
            if token.is_cancelled() {
                return Ok(());
            }
            let x = start + index as f64 * self.settings.step;
            if !(x <= upper) {
                return Ok(());
            }

            let y = spec.evaluate(x);
            let pitch = pitch_for(y);
            lock_engine(tone).trigger_attack_release(pitch, self.settings.note)?;
            *notes += 1;

            {
                let mut inner = self.lock();
                if !token.is_cancelled() {
                    inner.state.last_position = Some(x);
                }
            }
            debug!("[PLAYBACK] x = {}, y = {}, pitch = {}", x, y, pitch);

            if self.settings.interrupt_pacing {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.pacing) => {}
                    _ = token.cancelled() => {}
                }
            } else {
                tokio::time::sleep(self.settings.pacing).await;
            }
            index += 1;
        }
    }

    /// Stop the active run and silence the current note.
    ///
    /// The run notices at its next step boundary. The last position is
    /// kept so the next `play()` resumes there.
    pub fn stop(&self) {
        {
            let mut inner = self.lock();
            if let Some(token) = inner.cancel.take() {
                token.cancel();
            }
            if inner.state.is_playing() {
                inner.state.status = PlaybackStatus::Stopped;
                info!(
                    "[PLAYBACK] Stopped at {:?}",
                    inner.state.last_position
                );
            }
        }

        if let Some(tone) = &self.tone {
            lock_engine(tone).trigger_release();
        }
    }

    /// Stop, forget the resume point, restore the session defaults and
    /// ask for a redraw.
    pub fn reset(&self, session: &mut Session) {
        self.stop();
        {
            let mut inner = self.lock();
            inner.state.last_position = None;
            inner.state.status = PlaybackStatus::Idle;
        }
        session.restore_defaults();
        session.request_render();
        info!("[PLAYBACK] Reset");
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
