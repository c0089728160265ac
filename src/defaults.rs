//! Default configuration constants for gesturectl.
//!
//! Shared by the config file layer, the pipeline configs and the reference
//! player so that every entry point agrees on the same baseline.

/// Side length, in pixels, of the square the classifier input must fit into.
///
/// The larger dimension of the upright frame is scaled to this value; the
/// shorter one shrinks proportionally.
pub const TARGET_SIZE: u32 = 256;

/// Confidence a classification must strictly exceed to count as a gesture.
///
/// A score of exactly 0.7 is treated as "no gesture".
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Cadence of repeating actions (volume/pitch) while a gesture is held.
pub const REPEAT_INTERVAL_MS: u64 = 300;

/// How often the intake thread polls the frame source (~30 fps).
pub const FRAME_INTERVAL_MS: u64 = 33;

/// Captured frames buffered ahead of preprocessing before intake drops them.
pub const FRAME_BUFFER: usize = 8;

/// Control events (observations + timer ticks) buffered for the control station.
pub const CONTROL_BUFFER: usize = 64;

/// Longest virtual span a gesture script or trace tail may cover (one hour).
pub const MAX_SCRIPT_SPAN_MS: u64 = 3_600_000;

/// Volume steps exposed by the reference player (Android STREAM_MUSIC range).
pub const MAX_VOLUME: u8 = 15;

/// Starting volume step of the reference player.
pub const INITIAL_VOLUME: u8 = 7;

/// Neutral playback pitch.
pub const INITIAL_PITCH: f32 = 1.0;

/// Lowest pitch the reference player accepts.
pub const MIN_PITCH: f32 = 0.4;

/// Highest pitch the reference player accepts.
pub const MAX_PITCH: f32 = 2.0;

/// Pitch change applied per PitchUp/PitchDown action.
pub const PITCH_STEP: f32 = 0.2;

const _: () = assert!(INITIAL_VOLUME <= MAX_VOLUME);
