//! gesturectl - hand-gesture music playback control
//!
//! Camera frames are classified into hand gestures; stable gestures become
//! playback intents (volume, pitch, play/pause, next track).

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod classifier;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod control;
pub mod defaults;
pub mod error;
pub mod frame;
pub mod gesture;
pub mod pipeline;
pub mod playback;
pub mod script;
pub mod trace;

#[cfg(feature = "cli")]
pub mod app;

// Core traits (source → classify → control → sink)
pub use classifier::Classifier;
pub use control::RepeatScheduler;
pub use frame::FrameSource;
pub use playback::PlaybackIntentSink;

// Vocabulary
pub use gesture::{ControlAction, EventKind, GestureLabel, GestureObservation, StableGestureEvent};

// Pipeline
pub use pipeline::{Pipeline, PipelineConfig, PipelineHandle, PipelineStats};

// Error handling
pub use error::{GestureError, Result};

// Config
pub use config::{Config, PlayerConfig};

// Station framework (for advanced users)
pub use pipeline::{ErrorReporter, Station, StationError};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{version}+{hash}"),
        _ => version.to_string(),
    }
}
