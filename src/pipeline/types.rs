//! Data types exchanged between pipeline stations.

use crate::control::{Dispatch, TaskHandle};
use crate::gesture::{GestureObservation, StableGestureEvent};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Everything the control station consumes, serialized onto one queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// A completed (or degraded) classification.
    Observation(GestureObservation),
    /// A repeat timer fired.
    Tick(TaskHandle),
    /// Cancel any repeat task and stop.
    Shutdown,
}

/// What the control station did with one event.
#[derive(Debug, Default)]
pub struct ControlStep {
    pub events: Vec<StableGestureEvent>,
    pub dispatched: Vec<Dispatch>,
}

impl ControlStep {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.dispatched.is_empty()
    }
}

/// Live counters shared by the pipeline threads.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    pub frames_captured: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub frames_malformed: AtomicU64,
    pub frames_coalesced: AtomicU64,
    pub classifications: AtomicU64,
    pub classifier_failures: AtomicU64,
    pub stale_observations: AtomicU64,
    pub actions_applied: AtomicU64,
    pub actions_rejected: AtomicU64,
    pub actions_declined: AtomicU64,
}

impl PipelineCounters {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStats {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        PipelineStats {
            frames_captured: get(&self.frames_captured),
            frames_dropped: get(&self.frames_dropped),
            frames_malformed: get(&self.frames_malformed),
            frames_coalesced: get(&self.frames_coalesced),
            classifications: get(&self.classifications),
            classifier_failures: get(&self.classifier_failures),
            stale_observations: get(&self.stale_observations),
            actions_applied: get(&self.actions_applied),
            actions_rejected: get(&self.actions_rejected),
            actions_declined: get(&self.actions_declined),
        }
    }
}

/// Point-in-time copy of [`PipelineCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_captured: u64,
    /// Intake queue full.
    pub frames_dropped: u64,
    pub frames_malformed: u64,
    /// Replaced in the classifier slot before being classified.
    pub frames_coalesced: u64,
    pub classifications: u64,
    pub classifier_failures: u64,
    pub stale_observations: u64,
    pub actions_applied: u64,
    pub actions_rejected: u64,
    pub actions_declined: u64,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames: {} captured, {} dropped, {} malformed, {} coalesced | \
             classifications: {} ({} failed, {} stale) | \
             actions: {} applied, {} rejected, {} declined",
            self.frames_captured,
            self.frames_dropped,
            self.frames_malformed,
            self.frames_coalesced,
            self.classifications,
            self.classifier_failures,
            self.stale_observations,
            self.actions_applied,
            self.actions_rejected,
            self.actions_declined,
        )
    }
}
