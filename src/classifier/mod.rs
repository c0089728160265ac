//! Gesture classifier boundary.
//!
//! The model itself is external: an image goes in, a ranked list of
//! (category, score) pairs comes out. [`adapter`] turns that into
//! observations and owns the keep-latest submission slot.

pub mod adapter;
pub mod scripted;

pub use adapter::{ClassifierAdapter, SubmitOutcome, Submission, normalize};
pub use scripted::ScriptedClassifier;

use crate::error::{GestureError, Result};
use crate::frame::PreparedImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One ranked classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Model category name, e.g. `"Thumb_Up"`.
    pub category: String,
    pub score: f32,
}

impl Candidate {
    pub fn new(category: impl Into<String>, score: f32) -> Self {
        Self {
            category: category.into(),
            score,
        }
    }
}

/// Trait for gesture classification.
///
/// Calls may take arbitrarily long; the pipeline runs them on a dedicated
/// worker so the frame source is never blocked.
pub trait Classifier: Send + Sync {
    /// Classify one prepared image.
    fn classify(&self, image: &PreparedImage) -> Result<Vec<Candidate>>;

    /// Name of the loaded model
    fn name(&self) -> &str;

    /// Whether a submission can currently be accepted
    fn is_ready(&self) -> bool {
        true
    }
}

impl<T: Classifier> Classifier for Arc<T> {
    fn classify(&self, image: &PreparedImage) -> Result<Vec<Candidate>> {
        (**self).classify(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock classifier for testing
#[derive(Debug, Clone)]
pub struct MockClassifier {
    name: String,
    response: Vec<Candidate>,
    should_fail: bool,
    ready: bool,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockClassifier {
    /// Create a mock that reports no gesture
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: Vec::new(),
            should_fail: false,
            ready: true,
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock to return a single candidate
    pub fn with_response(mut self, category: &str, score: f32) -> Self {
        self.response = vec![Candidate::new(category, score)];
        self
    }

    /// Configure the mock to return a full candidate list
    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.response = candidates;
        self
    }

    /// Configure the mock to fail on classify
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to report not ready
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Configure the mock to sleep before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Shared counter of classify calls (survives moving the mock).
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _image: &PreparedImage) -> Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        if self.should_fail {
            Err(GestureError::Classification {
                message: "mock classification failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
