//! Command runners.
//!
//! `replay` drives the threaded pipeline with a scripted classifier and the
//! reference player; `trace` replays the same script on a virtual clock.

use crate::classifier::ScriptedClassifier;
use crate::config::Config;
use crate::error::{GestureError, Result};
use crate::frame::SyntheticFrameSource;
use crate::pipeline::{Pipeline, PipelineConfig, PipelineStats};
use crate::playback::PlayerSink;
use crate::script::Script;
use crate::trace::{Simulation, TraceKind, TraceLine};
use crossbeam_channel::Receiver;
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Synthetic camera resolution for replay.
const REPLAY_WIDTH: u32 = 640;
const REPLAY_HEIGHT: u32 = 480;

/// Settings shared by every command, taken from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub quiet: bool,
    /// 0 = results, 1 = actions, 2 = full gesture trace
    pub verbosity: u8,
    pub repeat_interval: Option<Duration>,
}

impl RunOptions {
    fn pipeline_config(&self, config: &Config) -> PipelineConfig {
        let mut pipeline = config.pipeline_config();
        pipeline.quiet = self.quiet;
        pipeline.verbosity = self.verbosity;
        if let Some(interval) = self.repeat_interval {
            pipeline.repeat_interval = interval;
        }
        pipeline
    }
}

/// Loads the config from `custom_path`, or from the default location when it
/// exists, then applies environment overrides and validates.
pub fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Runs the threaded pipeline until the frames run out or Ctrl+C.
pub async fn run_replay(
    config: &Config,
    script_path: &Path,
    fps: u32,
    frames: Option<u64>,
    options: &RunOptions,
) -> Result<PipelineStats> {
    let script = Script::load(script_path)?;
    if script.is_empty() {
        return Err(GestureError::Script {
            line: 0,
            message: format!("{} has no entries", script_path.display()),
        });
    }

    let mut pipeline_config = options.pipeline_config(config);
    pipeline_config.frame_interval = Duration::from_secs(1) / fps.max(1);

    let frame_count = frames.unwrap_or(script.len() as u64);
    let source = SyntheticFrameSource::new(REPLAY_WIDTH, REPLAY_HEIGHT, Some(frame_count));
    let classifier = Arc::new(ScriptedClassifier::new(script));

    let (status_tx, status_rx) = crossbeam_channel::unbounded();
    let sink = PlayerSink::new(&config.player, config.playlist()).with_status_sender(status_tx);

    if !options.quiet {
        eprintln!(
            "Replaying {} ({} frames at {} fps)",
            script_path.display(),
            frame_count,
            fps.max(1)
        );
    }

    let handle =
        Pipeline::new(pipeline_config).start(Box::new(source), classifier, Box::new(sink))?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(Duration::from_millis(50));

    let interrupted = loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.map_err(|e| GestureError::Other(format!("Failed to wait for Ctrl+C: {e}")))?;
                break true;
            }
            _ = poll.tick() => {
                print_status(&status_rx, options.quiet);
                if !handle.is_running() {
                    break false;
                }
            }
        }
    };

    let stats = if interrupted {
        if !options.quiet {
            eprintln!("\nShutting down...");
        }
        handle.stop()
    } else {
        handle.wait()
    };
    print_status(&status_rx, options.quiet);

    if !options.quiet {
        eprintln!("{}", stats.to_string().dimmed());
    }
    Ok(stats)
}

fn print_status(status_rx: &Receiver<String>, quiet: bool) {
    for message in status_rx.try_iter() {
        if !quiet {
            println!("{}", message.green());
        }
    }
}

/// Prints the virtual-clock trace of a script and returns every line.
pub fn run_trace(
    config: &Config,
    script_path: &Path,
    tail: Duration,
    options: &RunOptions,
) -> Result<Vec<TraceLine>> {
    let script = Script::load(script_path)?;
    let pipeline = options.pipeline_config(config);
    let sink = PlayerSink::new(&config.player, config.playlist());

    let mut simulation = Simulation::new(
        pipeline.confidence_threshold,
        pipeline.repeat_interval,
        Box::new(sink),
    );
    let lines = simulation.run(&script, tail);

    if !options.quiet {
        for line in lines.iter().filter(|l| is_visible(l, options.verbosity)) {
            print_trace_line(line);
        }
        eprintln!("{}", simulation.stats().to_string().dimmed());
    }
    Ok(lines)
}

/// Actions always show; gestures from -v; raw observations from -vv.
fn is_visible(line: &TraceLine, verbosity: u8) -> bool {
    match line.kind {
        TraceKind::Applied(_) | TraceKind::Rejected { .. } | TraceKind::Declined(_) => true,
        TraceKind::Gesture(_) | TraceKind::Stale | TraceKind::Unavailable => verbosity >= 1,
        TraceKind::Observation { .. } => verbosity >= 2,
    }
}

fn print_trace_line(line: &TraceLine) {
    match line.kind {
        TraceKind::Applied(_) => println!("{}", line.green()),
        TraceKind::Declined(_) | TraceKind::Stale => println!("{}", line.yellow()),
        TraceKind::Rejected { .. } | TraceKind::Unavailable => println!("{}", line.red()),
        TraceKind::Gesture(_) => println!("{line}"),
        TraceKind::Observation { .. } => println!("{}", line.dimmed()),
    }
}
