//! Observation → intent control stages.
//!
//! gate → debouncer → state machine, all driven from one consumer thread.

pub mod debounce;
pub mod gate;
pub mod machine;
pub mod scheduler;

pub use debounce::{GestureDebouncer, debounce};
pub use gate::ObservationGate;
pub use machine::{
    Binding, ControlState, ControlStateMachine, Dispatch, Effect, PlaybackStatus, RepeatTask,
    binding, transition,
};
pub use scheduler::{ManualScheduler, RepeatScheduler, TaskHandle, ThreadScheduler};
