//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::cli::FunctionArgs;
use crate::config::AppConfig;
use crate::engine::{
    share, PlaybackController, PlaybackOutcome, PlaybackSettings, ToneEngine, WavToneEngine,
};
use crate::error::Result;
use crate::expr::FunctionSpec;
use crate::render::{GraphRenderer, GraphStyle, SvgSurface};
use crate::sampling::{Sample, SampleSeries, ScaleFactor};
use crate::state::PreferenceStore;

/// Dark mode used when no preference has been stored
const SYSTEM_DARK_MODE: bool = false;

/// Evaluate an expression at each x.
pub fn eval(expression: &str, xs: &[f64]) -> Result<()> {
    let spec = match FunctionSpec::compile(expression) {
        Ok(spec) => spec,
        Err(e) => {
            println!("ERROR: {}", e);
            for suggestion in e.recovery_suggestions() {
                println!("  - {}", suggestion);
            }
            println!("Every evaluation falls back to 0.");
            FunctionSpec::new(expression)
        }
    };

    for &x in xs {
        match spec.try_evaluate(x) {
            Ok(y) => println!("f({}) = {}", x, y),
            Err(e) if spec.is_valid() => println!("f({}) = 0  ({})", x, e),
            Err(_) => println!("f({}) = 0", x),
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct SampleDump<'a> {
    expression: &'a str,
    lower: f64,
    upper: f64,
    scale: ScaleFactor,
    step: f64,
    samples: Vec<Sample>,
}

/// Print the sample series as JSON.
pub fn samples(function: &FunctionArgs, step: Option<f64>, config: &AppConfig) -> Result<()> {
    println!("{}", samples_json(function, step, config)?);
    Ok(())
}

/// Sample series with its domain and scale, as pretty JSON
pub fn samples_json(function: &FunctionArgs, step: Option<f64>, config: &AppConfig) -> Result<String> {
    let session = function.to_session();
    let step = step.unwrap_or(config.sampling.step);
    let series = SampleSeries::generate(&session.spec, session.domain, step);

    let dump = SampleDump {
        expression: session.spec.expression_text(),
        lower: session.domain.lower,
        upper: session.domain.upper,
        scale: series.scale(),
        step,
        samples: series.collect(),
    };
    Ok(serde_json::to_string_pretty(&dump)?)
}

/// Render the graph to an SVG file.
pub fn graph(function: &FunctionArgs, output: &Path, config: &AppConfig, prefs: &Path) -> Result<()> {
    let session = function.to_session();
    info!(
        "Rendering '{}' over [{}, {}]",
        session.spec.expression_text(),
        session.domain.lower,
        session.domain.upper
    );

    let theme = PreferenceStore::open(prefs)?.theme(SYSTEM_DARK_MODE);
    let mut surface = SvgSurface::new(config.canvas.width, config.canvas.height, theme.background());
    let renderer = GraphRenderer::new(GraphStyle::from(&config.canvas));
    let summary = renderer.render(&mut surface, &session.spec, session.domain, config.sampling.step);
    surface.save(output)?;

    println!("Graph written: {}", output.display());
    println!("Scale factor: {}", summary.scale);
    match (summary.min_y, summary.max_y) {
        (Some(min_y), Some(max_y)) => println!("y range: [{:.4}, {:.4}]", min_y, max_y),
        _ => println!("y range: empty (lower limit exceeds upper limit)"),
    }
    println!("Points drawn: {}", summary.points_drawn);

    Ok(())
}

/// Sonify the function into a WAV file.
///
/// With `stop_after`, playback is stopped after that many notes and then
/// resumed from where it stopped. Returns the number of notes written.
pub async fn play(
    function: &FunctionArgs,
    output: &Path,
    stop_after: Option<u32>,
    config: &AppConfig,
) -> Result<usize> {
    let session = function.to_session();
    let engine = share(WavToneEngine::new(&config.audio));
    let controller =
        PlaybackController::new(PlaybackSettings::from(&config.playback)).with_tone_engine(engine.clone());
    let pacing = controller.settings().pacing;

    println!("=== Fxtone Playback ===");
    println!("f(x) = {}", session.spec.expression_text());
    println!("Domain: [{}, {}]", session.domain.lower, session.domain.upper);

    let (first, _) = tokio::join!(controller.play(&session.spec, session.domain), async {
        if let Some(notes) = stop_after {
            // Midway through the pacing gap after the n-th note
            tokio::time::sleep(pacing.mul_f64(notes as f64 - 0.5)).await;
            controller.stop();
        }
    });
    report(&first);

    if let PlaybackOutcome::Stopped { .. } = first {
        println!("Resuming from x = {:?}", controller.last_position());
        let resumed = controller.play(&session.spec, session.domain).await;
        report(&resumed);
    }

    let mut engine = engine.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if engine.notes().is_empty() {
        warn!("No notes were played, writing an empty file");
    }
    engine.write_wav(output)?;
    engine.dispose();

    let written = engine.notes().len();
    println!("Audio written: {} ({} notes)", output.display(), written);

    Ok(written)
}

fn report(outcome: &PlaybackOutcome) {
    match outcome {
        PlaybackOutcome::Completed { notes } => println!("Completed: {} notes", notes),
        PlaybackOutcome::Stopped { notes, at } => {
            println!("Stopped after {} notes at x = {:?}", notes, at)
        }
        PlaybackOutcome::AlreadyPlaying => println!("Already playing"),
        PlaybackOutcome::Unavailable => println!("Audio unavailable: no tone engine could be started"),
        PlaybackOutcome::Faulted { notes } => println!("Playback failed after {} notes", notes),
    }
}

/// Show or toggle the dark-mode preference.
pub fn theme(prefs: &Path, toggle: bool) -> Result<()> {
    let mut store = PreferenceStore::open(prefs)?;
    let dark = if toggle {
        store.toggle_dark_mode(SYSTEM_DARK_MODE)?
    } else {
        store.dark_mode(SYSTEM_DARK_MODE)
    };

    println!("Dark mode: {}", if dark { "on" } else { "off" });
    if let Some(updated) = store.updated_at() {
        println!("Last changed: {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(expr: &str, lower: f64, upper: f64) -> FunctionArgs {
        FunctionArgs {
            expr: expr.to_string(),
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    #[test]
    fn test_graph_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("graph.svg");
        let prefs = dir.path().join("prefs.json");

        graph(&args("x * x", -10.0, 10.0), &output, &AppConfig::default(), &prefs).unwrap();

        let svg = std::fs::read_to_string(&output).unwrap().to_lowercase();
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("#f3f4f6"));
    }

    #[test]
    fn test_graph_uses_dark_theme() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("graph.svg");
        let prefs = dir.path().join("prefs.json");
        theme(&prefs, true).unwrap();

        graph(&args("x", -1.0, 1.0), &output, &AppConfig::default(), &prefs).unwrap();

        let svg = std::fs::read_to_string(&output).unwrap().to_lowercase();
        assert!(svg.contains("#111827"));
    }

    #[test]
    fn test_eval_invalid_expression_is_not_an_error() {
        assert!(eval("x +", &[1.0, 2.0]).is_ok());
    }

    #[test]
    fn test_samples_json_reports_scale_and_count() {
        let json = samples_json(&args("x * x", -10.0, 10.0), None, &AppConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["expression"], "x * x");
        assert_eq!(value["scale"], "One");
        let samples = value["samples"].as_array().unwrap();
        assert_eq!(samples.len(), 201);
        assert_eq!(samples[200]["x"], 10.0);
        assert_eq!(samples[200]["y"], 100.0);
    }

    #[test]
    fn test_samples_json_uses_step_and_scale() {
        let json = samples_json(&args("x", -1000.0, 1000.0), Some(1.0), &AppConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["scale"], "Ten");
        assert_eq!(value["step"], 1.0);
        assert_eq!(value["samples"].as_array().unwrap().len(), 201);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_with_stop_and_resume_writes_all_notes() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.wav");

        let written = play(&args("x", 0.0, 5.0), &output, Some(2), &AppConfig::default())
            .await
            .unwrap();

        // x = 0, 1 before the stop, then 1..=5 after resuming
        assert_eq!(written, 7);

        // Last note starts at 0.55s and lasts an eighth (0.25s at 120 bpm)
        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().channels, 1);
        let expected = (0.80 * 48_000.0) as i64;
        assert!((reader.len() as i64 - expected).abs() <= 1);
    }
}
