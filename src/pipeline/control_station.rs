use crate::control::{ControlStateMachine, Dispatch, GestureDebouncer, ObservationGate};
use crate::gesture::GestureObservation;
use crate::pipeline::error::{ErrorReporter, StationError, eprintln_clear};
use crate::pipeline::station::Station;
use crate::pipeline::types::{ControlEvent, ControlStep, PipelineCounters};
use std::sync::Arc;
use std::time::Instant;

/// Sole consumer of the control queue.
///
/// Owns the gate, the debouncer and the state machine (and through it the
/// sink), so none of them needs locking.
pub struct ControlStation {
    gate: ObservationGate,
    debouncer: GestureDebouncer,
    machine: ControlStateMachine,
    last_accepted: Option<Instant>,
    counters: Arc<PipelineCounters>,
    reporter: Arc<dyn ErrorReporter>,
    verbosity: u8,
    finished: bool,
}

impl ControlStation {
    pub fn new(
        gate: ObservationGate,
        machine: ControlStateMachine,
        counters: Arc<PipelineCounters>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            gate,
            debouncer: GestureDebouncer::new(),
            machine,
            last_accepted: None,
            counters,
            reporter,
            verbosity: 0,
            finished: false,
        }
    }

    /// 1 logs dispatched actions, 2 also logs gesture events.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn machine(&self) -> &ControlStateMachine {
        &self.machine
    }

    /// Runs one control event through gate, debouncer and state machine.
    pub fn handle_event(&mut self, event: ControlEvent) -> ControlStep {
        let mut step = ControlStep::default();

        match event {
            ControlEvent::Observation(observation) => {
                if !self.accept(&observation) {
                    PipelineCounters::bump(&self.counters.stale_observations);
                    return step;
                }
                let label = self.gate.filter(&observation);
                step.events = self.debouncer.push(label, observation.timestamp);
                for gesture in &step.events {
                    step.dispatched.extend(self.machine.handle(gesture));
                }
            }
            ControlEvent::Tick(handle) => {
                step.dispatched.extend(self.machine.on_tick(handle));
            }
            ControlEvent::Shutdown => {
                self.machine.reset();
                self.debouncer.reset();
                self.finished = true;
            }
        }

        self.account(&step);
        step
    }

    // Observations older than the last accepted one are out of order.
    fn accept(&mut self, observation: &GestureObservation) -> bool {
        if let Some(last) = self.last_accepted
            && observation.timestamp < last
        {
            return false;
        }
        self.last_accepted = Some(observation.timestamp);
        true
    }

    fn account(&self, step: &ControlStep) {
        if self.verbosity >= 2 {
            for gesture in &step.events {
                eprintln_clear(&format!("  [gesture] {gesture}"));
            }
        }
        for dispatch in &step.dispatched {
            match dispatch {
                Dispatch::Applied(action) => {
                    PipelineCounters::bump(&self.counters.actions_applied);
                    if self.verbosity >= 1 {
                        eprintln_clear(&format!("  [action] {action}"));
                    }
                }
                Dispatch::Rejected(_, error) => {
                    PipelineCounters::bump(&self.counters.actions_rejected);
                    self.reporter.report(self.name(), &StationError::from(error));
                }
                Dispatch::Declined(action) => {
                    PipelineCounters::bump(&self.counters.actions_declined);
                    if self.verbosity >= 1 {
                        eprintln_clear(&format!("  [action] {action} declined"));
                    }
                }
            }
        }
    }
}

impl Station for ControlStation {
    type Input = ControlEvent;
    type Output = ControlStep;

    fn name(&self) -> &'static str {
        "control"
    }

    fn process(&mut self, event: ControlEvent) -> Result<Option<ControlStep>, StationError> {
        let step = self.handle_event(event);
        Ok((!step.is_empty()).then_some(step))
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn shutdown(&mut self) {
        // Input may close without a Shutdown event.
        self.machine.reset();
    }
}
