//! Station errors and how they are surfaced.

use crate::error::GestureError;
use std::fmt;

/// Errors raised while a station processes one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationError {
    /// The item is lost; the station keeps running.
    Recoverable(String),
    /// The station stops after reporting.
    Fatal(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Recoverable(msg) => write!(f, "{msg}"),
            StationError::Fatal(msg) => write!(f, "fatal: {msg}"),
        }
    }
}

impl std::error::Error for StationError {}

impl From<&GestureError> for StationError {
    /// Every core error degrades gracefully; none stops a station.
    fn from(error: &GestureError) -> Self {
        StationError::Recoverable(error.to_string())
    }
}

/// Sink for station errors.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, station: &str, error: &StationError);
}

/// Writes station errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        eprintln_clear(&format!("gesturectl [{station}] {error}"));
    }
}

/// Discards every report. Used in quiet mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ErrorReporter for SilentReporter {
    fn report(&self, _station: &str, _error: &StationError) {}
}

/// Print a message to stderr, clearing any in-place status line first.
pub fn eprintln_clear(msg: &str) {
    eprint!("\r{:60}\r", "");
    eprintln!("{msg}");
}
