//! Threaded gesture pipeline.
//!
//! Each station runs on its own thread, connected by bounded crossbeam
//! channels. Observations and repeat ticks meet on one control queue with a
//! single consumer.

pub mod classifier_station;
pub mod control_station;
pub mod error;
pub mod frame_station;
pub mod orchestrator;
pub mod station;
pub mod types;

pub use classifier_station::ClassifierStation;
pub use control_station::ControlStation;
pub use error::{ErrorReporter, LogReporter, SilentReporter, StationError, eprintln_clear};
pub use frame_station::FrameStation;
pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle};
pub use station::{Station, StationRunner};
pub use types::{ControlEvent, ControlStep, PipelineCounters, PipelineStats};
