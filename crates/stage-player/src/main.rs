//! Stage Player - headless scene player binary
//!
//! Loads a project document, plays it for a number of frames on simulated
//! time and reports what the renderer saw.
//!
//! Usage:
//!   stage-player <project.json> [--config player.toml] [--frames N] [--fps F]
//!                [--width W --height H] [--offline] [--input events.json]

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::Deserialize;
use stage_core::lock;
use stage_player::{HeadlessRenderer, Player, PlayerConfig};
use stage_runtime::{InputEvent, ManualTimeSource};
use std::path::Path;

#[derive(Parser)]
#[command(name = "stage-player")]
#[command(about = "Stage player - run scripted scenes headless")]
struct Args {
    /// Path to the project document (JSON)
    project: String,

    /// Path to a player configuration file
    #[arg(long, default_value = "player.toml")]
    config: String,

    /// Number of frames to run
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Simulated frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Viewport width (overrides config)
    #[arg(long)]
    width: Option<f64>,

    /// Viewport height (overrides config)
    #[arg(long)]
    height: Option<f64>,

    /// Render each frame at a fixed time instead of playing
    #[arg(long)]
    offline: bool,

    /// JSON list of `{ "frame": N, "event": {..} }` input events to replay
    #[arg(long)]
    input: Option<String>,
}

/// An input event delivered before a given frame
#[derive(Debug, Deserialize)]
struct ScheduledInput {
    frame: u64,
    event: InputEvent,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = if Path::new(&args.config).exists() {
        PlayerConfig::load(&args.config).context("Failed to load player config")?
    } else {
        PlayerConfig::default()
    };
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.filter.as_str()),
    )
    .init();

    if !(args.fps.is_finite() && args.fps > 0.0) {
        bail!("--fps must be positive, got {}", args.fps);
    }

    let mut inputs = match &args.input {
        Some(path) => load_inputs(path)?,
        None => Vec::new(),
    };
    inputs.sort_by_key(|i| i.frame);

    let json = std::fs::read_to_string(&args.project)
        .with_context(|| format!("Failed to read {}", args.project))?;

    let renderer = HeadlessRenderer::new();
    let stats = renderer.stats();
    let time = ManualTimeSource::new();
    let mut player = Player::with_time_source(&config, Box::new(renderer), Box::new(time.clone()));

    player.load_str(&json).context("Failed to load project")?;

    let report = player.last_bind_report();
    println!("Loaded project: {}", args.project);
    println!(
        "Scripts: {} bound on {} node(s), {} handler(s)",
        report.bound_scripts, report.resolved_nodes, report.handlers
    );
    for diag in &report.diagnostics {
        println!("  ! {}", diag);
    }

    let frame_ms = 1000.0 / args.fps;
    let mut pending = inputs.into_iter().peekable();

    if args.offline {
        for frame in 0..args.frames {
            player.render(frame as f64 / args.fps);
        }
    } else {
        player.play();
        for frame in 0..args.frames {
            while let Some(scheduled) = pending.next_if(|i| i.frame <= frame) {
                if !player.handle_input(&scheduled.event) {
                    warn!(target: "stage::player", "Input for frame {} not delivered", frame);
                }
            }
            time.advance_ms(frame_ms);
            if !player.on_frame() {
                info!(target: "stage::player", "Playback stopped at frame {}", frame);
                break;
            }
        }
        if player.is_playing() {
            player.stop();
        }
    }

    let failures = player.drain_runtime_diagnostics();
    for diag in &failures {
        println!("  ! {}", diag);
    }

    {
        let stats = lock(&stats);
        println!(
            "Rendered {} frame(s) at {}x{} ({} node(s) in the last frame, {} handler error(s))",
            stats.frames,
            stats.buffer_size.0,
            stats.buffer_size.1,
            stats.drawn_nodes,
            failures.len()
        );
    }

    player.dispose();
    Ok(())
}

fn load_inputs(path: &str) -> Result<Vec<ScheduledInput>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path))
}
