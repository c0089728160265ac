use crate::classifier::Classifier;
use crate::classifier::Submission;
use crate::classifier::adapter::classify_submission;
use crate::gesture::GestureObservation;
use crate::pipeline::error::{ErrorReporter, StationError, eprintln_clear};
use crate::pipeline::station::Station;
use crate::pipeline::types::{ControlEvent, PipelineCounters};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// The single classification worker.
///
/// Every submission produces exactly one observation; failures degrade to
/// `None` so the control side sees the gesture drop.
pub struct ClassifierStation {
    classifier: Arc<dyn Classifier>,
    worker_alive: Arc<AtomicBool>,
    counters: Arc<PipelineCounters>,
    reporter: Arc<dyn ErrorReporter>,
    verbose: bool,
}

impl ClassifierStation {
    /// `worker_alive` is the adapter's flag; it is cleared on shutdown.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        worker_alive: Arc<AtomicBool>,
        counters: Arc<PipelineCounters>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            classifier,
            worker_alive,
            counters,
            reporter,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Station for ClassifierStation {
    type Input = Submission;
    type Output = ControlEvent;

    fn name(&self) -> &'static str {
        "classifier"
    }

    fn process(&mut self, submission: Submission) -> Result<Option<ControlEvent>, StationError> {
        let started = Instant::now();
        let observation = match classify_submission(self.classifier.as_ref(), &submission) {
            Ok(observation) => {
                PipelineCounters::bump(&self.counters.classifications);
                observation
            }
            Err(e) => {
                PipelineCounters::bump(&self.counters.classifier_failures);
                self.reporter.report(self.name(), &StationError::from(&e));
                GestureObservation::none(submission.timestamp)
            }
        };

        if self.verbose {
            eprintln_clear(&format!(
                "  [classify #{}] {} {:.2} in {}ms",
                submission.sequence,
                observation.label,
                observation.confidence,
                started.elapsed().as_millis()
            ));
        }

        Ok(Some(ControlEvent::Observation(observation)))
    }

    fn shutdown(&mut self) {
        self.worker_alive.store(false, Ordering::SeqCst);
    }
}
