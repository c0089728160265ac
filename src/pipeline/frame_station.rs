use crate::classifier::{ClassifierAdapter, SubmitOutcome, Submission};
use crate::frame::{CapturedFrame, FramePreprocessor};
use crate::gesture::GestureObservation;
use crate::pipeline::error::{ErrorReporter, StationError};
use crate::pipeline::station::Station;
use crate::pipeline::types::{ControlEvent, PipelineCounters};
use std::sync::Arc;

/// Preprocesses captured frames and offers them to the classifier slot.
///
/// Produces output only when the classifier is unavailable: the frame then
/// stands for an implicit `None` observation so a held gesture still ends.
pub struct FrameStation {
    preprocessor: FramePreprocessor,
    adapter: ClassifierAdapter,
    counters: Arc<PipelineCounters>,
    reporter: Arc<dyn ErrorReporter>,
    unavailable_reported: bool,
}

impl FrameStation {
    pub fn new(
        preprocessor: FramePreprocessor,
        adapter: ClassifierAdapter,
        counters: Arc<PipelineCounters>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            preprocessor,
            adapter,
            counters,
            reporter,
            unavailable_reported: false,
        }
    }
}

impl Station for FrameStation {
    type Input = CapturedFrame;
    type Output = ControlEvent;

    fn name(&self) -> &'static str {
        "frame"
    }

    fn process(&mut self, captured: CapturedFrame) -> Result<Option<ControlEvent>, StationError> {
        let image = match self.preprocessor.prepare(&captured.frame) {
            Ok(image) => image,
            Err(e) => {
                PipelineCounters::bump(&self.counters.frames_malformed);
                return Err(StationError::from(&e));
            }
        };

        let submission = Submission::new(image, captured.timestamp, captured.sequence);
        match self.adapter.submit(submission) {
            Ok(outcome) => {
                if outcome == SubmitOutcome::Coalesced {
                    PipelineCounters::bump(&self.counters.frames_coalesced);
                }
                self.unavailable_reported = false;
                Ok(None)
            }
            Err(e) => {
                // Report once per outage, not once per frame.
                if !self.unavailable_reported {
                    self.reporter.report(self.name(), &StationError::from(&e));
                    self.unavailable_reported = true;
                }
                Ok(Some(ControlEvent::Observation(GestureObservation::none(
                    captured.timestamp,
                ))))
            }
        }
    }
}
