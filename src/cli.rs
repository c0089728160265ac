//! Command-line interface for gesturectl
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Hand-gesture music playback control
#[derive(Parser, Debug)]
#[command(
    name = "gesturectl",
    version,
    about = "Hand-gesture music playback control"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: actions, -vv: full gesture trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Cadence of repeating actions while a gesture is held. Examples: 300ms, 1s
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_interval)]
    pub repeat_interval: Option<Duration>,
}

/// Parse a duration; bare numbers are milliseconds.
fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return non_zero(Duration::from_millis(ms));
    }
    humantime::parse_duration(s)
        .map_err(|e| e.to_string())
        .and_then(non_zero)
}

fn non_zero(d: Duration) -> Result<Duration, String> {
    if d.is_zero() {
        Err("interval must be greater than zero".to_string())
    } else {
        Ok(d)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the threaded pipeline against a gesture script
    Replay {
        /// JSON-lines gesture script
        script: PathBuf,

        /// Synthetic camera frame rate
        #[arg(long, value_name = "N", default_value_t = 30)]
        fps: u32,

        /// Number of frames to emit (default: one per script entry)
        #[arg(long, value_name = "N")]
        frames: Option<u64>,
    },

    /// Print a deterministic virtual-clock trace of a gesture script
    Trace {
        /// JSON-lines gesture script
        script: PathBuf,

        /// Keep the virtual clock running after the last entry
        #[arg(long, value_name = "DURATION", default_value = "1s", value_parser = humantime::parse_duration)]
        tail: Duration,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay_defaults() {
        let cli = Cli::try_parse_from(["gesturectl", "replay", "gestures.jsonl"]).unwrap();
        match cli.command {
            Commands::Replay {
                script,
                fps,
                frames,
            } => {
                assert_eq!(script, PathBuf::from("gestures.jsonl"));
                assert_eq!(fps, 30);
                assert!(frames.is_none());
            }
            other => panic!("Expected Replay, got {other:?}"),
        }
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.repeat_interval.is_none());
    }

    #[test]
    fn test_parse_replay_options() {
        let cli = Cli::try_parse_from([
            "gesturectl",
            "replay",
            "s.jsonl",
            "--fps",
            "10",
            "--frames",
            "42",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay { fps, frames, .. } => {
                assert_eq!(fps, 10);
                assert_eq!(frames, Some(42));
            }
            other => panic!("Expected Replay, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_trace_tail() {
        let cli =
            Cli::try_parse_from(["gesturectl", "trace", "s.jsonl", "--tail", "2s500ms"]).unwrap();
        match cli.command {
            Commands::Trace { tail, .. } => assert_eq!(tail, Duration::from_millis(2500)),
            other => panic!("Expected Trace, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_command() {
        let cli = Cli::try_parse_from([
            "gesturectl",
            "trace",
            "s.jsonl",
            "-vv",
            "--repeat-interval",
            "450ms",
            "--config",
            "/tmp/config.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.repeat_interval, Some(Duration::from_millis(450)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
    }

    #[test]
    fn test_bare_repeat_interval_is_millis() {
        assert_eq!(parse_interval("250"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_interval("1s"), Ok(Duration::from_secs(1)));
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("soon").is_err());
    }

    #[test]
    fn test_parse_config_actions() {
        let cli = Cli::try_parse_from(["gesturectl", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
        let cli = Cli::try_parse_from(["gesturectl", "-q", "config", "path"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["gesturectl"]).is_err());
    }

    #[test]
    fn test_invalid_command_returns_error() {
        let err = Cli::try_parse_from(["gesturectl", "invalid"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["gesturectl", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
