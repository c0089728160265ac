//! Deterministic virtual-clock replay of a gesture script.
//!
//! Runs the control stages (gate, debouncer, state machine) exactly as the
//! threaded pipeline does, but with a [`ManualScheduler`] instead of timer
//! threads. Each script entry is delivered at `at_ms + latency_ms` and
//! stamped with `at_ms`, so a slow entry overtaken by a faster one shows up
//! as a stale drop.

use crate::classifier::normalize;
use crate::control::{ControlStateMachine, Dispatch, ManualScheduler, ObservationGate};
use crate::defaults;
use crate::gesture::{ControlAction, GestureLabel, GestureObservation, StableGestureEvent};
use crate::pipeline::{
    ControlEvent, ControlStation, ControlStep, PipelineCounters, PipelineStats, SilentReporter,
};
use crate::playback::PlaybackIntentSink;
use crate::script::Script;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What happened at one virtual instant.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceKind {
    Observation { label: GestureLabel, confidence: f32 },
    Unavailable,
    Stale,
    Gesture(StableGestureEvent),
    Applied(ControlAction),
    Rejected { action: ControlAction, reason: String },
    Declined(ControlAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceLine {
    /// Virtual time since script start.
    pub at: Duration,
    pub kind: TraceKind,
}

impl TraceLine {
    /// True for lines that reached the sink.
    pub fn is_action(&self) -> bool {
        matches!(
            self.kind,
            TraceKind::Applied(_) | TraceKind::Rejected { .. } | TraceKind::Declined(_)
        )
    }
}

impl fmt::Display for TraceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8.3}s  ", self.at.as_secs_f64())?;
        match &self.kind {
            TraceKind::Observation { label, confidence } => {
                write!(f, "observe  {label} {confidence:.2}")
            }
            TraceKind::Unavailable => f.write_str("observe  classifier unavailable"),
            TraceKind::Stale => f.write_str("observe  stale, dropped"),
            TraceKind::Gesture(event) => write!(f, "gesture  {event}"),
            TraceKind::Applied(action) => write!(f, "action   {action}"),
            TraceKind::Rejected { action, reason } => {
                write!(f, "action   {action} rejected: {reason}")
            }
            TraceKind::Declined(action) => write!(f, "action   {action} declined"),
        }
    }
}

pub struct Simulation {
    station: ControlStation,
    scheduler: ManualScheduler,
    counters: Arc<PipelineCounters>,
    base: Instant,
}

impl Simulation {
    pub fn new(
        threshold: f32,
        repeat_interval: Duration,
        sink: Box<dyn PlaybackIntentSink>,
    ) -> Self {
        let scheduler = ManualScheduler::new();
        let counters = PipelineCounters::shared();
        let machine = ControlStateMachine::new(Box::new(scheduler.clone()), sink)
            .with_interval(repeat_interval);
        let station = ControlStation::new(
            ObservationGate::new(threshold),
            machine,
            counters.clone(),
            Arc::new(SilentReporter),
        );
        Self {
            station,
            scheduler,
            counters,
            base: Instant::now(),
        }
    }

    /// Replays `script`, then keeps the clock running for `tail` so a held
    /// gesture's repeats show up. The tail is capped at one hour.
    pub fn run(&mut self, script: &Script, tail: Duration) -> Vec<TraceLine> {
        let mut deliveries: Vec<(Duration, usize)> = script
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.at() + entry.latency(), index))
            .collect();
        deliveries.sort_by_key(|&(delivered, index)| (delivered, index));

        let mut lines = Vec::new();
        let mut end = Duration::ZERO;

        for (delivered, index) in deliveries {
            self.run_ticks_until(delivered, &mut lines);
            end = end.max(delivered);

            let entry = &script.entries[index];
            let stamped = self.base + entry.at();
            let observation = if entry.unavailable {
                lines.push(TraceLine {
                    at: delivered,
                    kind: TraceKind::Unavailable,
                });
                GestureObservation::none(stamped)
            } else {
                let observation = normalize(&entry.candidates(), stamped);
                lines.push(TraceLine {
                    at: delivered,
                    kind: TraceKind::Observation {
                        label: observation.label,
                        confidence: observation.confidence,
                    },
                });
                observation
            };

            let stale_before = self.counters.snapshot().stale_observations;
            let step = self
                .station
                .handle_event(ControlEvent::Observation(observation));
            if self.counters.snapshot().stale_observations > stale_before {
                lines.push(TraceLine {
                    at: delivered,
                    kind: TraceKind::Stale,
                });
            }
            record(delivered, step, &mut lines);
        }

        let tail = tail.min(Duration::from_millis(defaults::MAX_SCRIPT_SPAN_MS));
        self.run_ticks_until(end + tail, &mut lines);
        self.station.handle_event(ControlEvent::Shutdown);
        lines
    }

    fn run_ticks_until(&mut self, until: Duration, lines: &mut Vec<TraceLine>) {
        for (at, handle) in self.scheduler.advance_to(until) {
            let step = self.station.handle_event(ControlEvent::Tick(handle));
            record(at, step, lines);
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }

    pub fn sink(&self) -> &dyn PlaybackIntentSink {
        self.station.machine().sink()
    }
}

fn record(at: Duration, step: ControlStep, lines: &mut Vec<TraceLine>) {
    for event in step.events {
        lines.push(TraceLine {
            at,
            kind: TraceKind::Gesture(event),
        });
    }
    for dispatch in step.dispatched {
        let kind = match dispatch {
            Dispatch::Applied(action) => TraceKind::Applied(action),
            Dispatch::Rejected(action, error) => TraceKind::Rejected {
                action,
                reason: error.to_string(),
            },
            Dispatch::Declined(action) => TraceKind::Declined(action),
        };
        lines.push(TraceLine { at, kind });
    }
}
