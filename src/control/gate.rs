use crate::defaults;
use crate::gesture::{GestureLabel, GestureObservation};

/// Confidence threshold applied to every observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationGate {
    threshold: f32,
}

impl Default for ObservationGate {
    fn default() -> Self {
        Self::new(defaults::CONFIDENCE_THRESHOLD)
    }
}

impl ObservationGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns the label if its confidence is strictly above the threshold,
    /// otherwise `None`. NaN never passes.
    pub fn filter(&self, observation: &GestureObservation) -> GestureLabel {
        if observation.confidence > self.threshold {
            observation.label
        } else {
            GestureLabel::None
        }
    }
}
