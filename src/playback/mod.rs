//! Playback side of the pipeline: the intent sink boundary and a reference
//! player implementation.

pub mod player;
pub mod playlist;
pub mod sink;

pub use player::PlayerSink;
pub use playlist::{Playlist, Track};
pub use sink::{PlaybackIntentSink, RecordingSink, SinkCall, SinkLog};
