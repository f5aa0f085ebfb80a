// keyfall: headless chart tool for the keyfall play engine.
//
// Loads raw track JSON, builds the 7-lane chart, rates it, and
// optionally runs a scripted perfect play through the full session
// state machine.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use keyfall_play::{
    EngineConfig, GamePhase, InputProvider, MockTimeProvider, PlayResult, PlaySession,
    ScriptedInput, TimeProvider,
};
use midi_model::{Chart, ChartBuilder, ChartOptions, difficulty, load_tracks};

/// Simulation frame step (roughly 120 fps).
const FRAME_US: i64 = 8_000;

#[derive(Parser, Debug)]
#[command(name = "keyfall", about = "7-lane falling-note chart analyzer and simulator")]
struct Args {
    /// Path to a raw track JSON file.
    chart: PathBuf,

    /// Judgment preset: easy, normal, hard, very-hard.
    #[arg(long, default_value = "normal")]
    preset: String,

    /// Audio offset in milliseconds, applied to the chart clock.
    #[arg(long, default_value_t = 0)]
    offset_ms: i32,

    /// Minimum note duration in seconds to become a hold.
    #[arg(long)]
    long_note_threshold: Option<f64>,

    /// Declared song duration in seconds, when the source media is
    /// longer than the last note.
    #[arg(long)]
    duration: Option<f64>,

    /// Print chart statistics only; skip the simulation.
    #[arg(long)]
    analyze: bool,

    /// Emit the play result as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.chart)
        .with_context(|| format!("reading {}", args.chart.display()))?;
    let tracks = load_tracks(&raw)?;

    let mut options = ChartOptions::default();
    if let Some(threshold) = args.long_note_threshold {
        options.long_note_threshold = threshold;
    }
    if let Some(duration) = args.duration {
        options.declared_duration = duration;
    }
    let chart = ChartBuilder::build(&tracks, &options);
    let rating = difficulty(&chart);

    println!(
        "chart: {} notes ({} holds), {:.1}s, difficulty {}/20",
        chart.total_notes(),
        chart.long_note_count(),
        chart.duration_us as f64 / 1_000_000.0,
        rating
    );
    if args.analyze {
        return Ok(());
    }

    let config = EngineConfig {
        judge_preset: args.preset.clone(),
        audio_offset_ms: args.offset_ms,
        ..Default::default()
    };
    let result = simulate(chart, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("score {} (max combo {})", result.score, result.max_combo);
        println!(
            "perfect {} / great {} / good {} / miss {}",
            result.judgments.perfect,
            result.judgments.great,
            result.judgments.good,
            result.judgments.miss
        );
        println!("accuracy {:.1}%  grade {:?}", result.accuracy, result.grade);
    }
    Ok(())
}

/// Run a scripted perfect play to completion at a fixed frame step.
/// Input is only drained once the session is playing; a note at chart
/// time zero would otherwise lose its press to the countdown.
fn simulate(chart: Chart, config: &EngineConfig) -> Result<PlayResult> {
    let mut input = ScriptedInput::from_chart(&chart);
    let mut session = PlaySession::new(chart, config);
    let clock = MockTimeProvider::new();
    session.start(clock.now_us());

    while session.phase() == GamePhase::Countdown {
        session.update(clock.step(FRAME_US));
    }
    while session.phase() == GamePhase::Playing {
        let wall = clock.step(FRAME_US);
        session.update(wall);
        for event in input.poll_events(session.current_time_us()) {
            if event.pressed {
                session.key_press(event.lane, wall);
            } else {
                session.key_release(event.lane, wall);
            }
        }
    }
    session
        .result()
        .cloned()
        .context("session ended without a result")
}
