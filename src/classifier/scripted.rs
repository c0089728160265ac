use crate::classifier::{Candidate, Classifier};
use crate::error::{GestureError, Result};
use crate::frame::PreparedImage;
use crate::script::{Script, ScriptEntry};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Classifier that answers from a script, one entry per call.
///
/// Pixel content is ignored. Once the script runs out every call returns
/// an empty candidate list, which the adapter reads as "no gesture".
pub struct ScriptedClassifier {
    entries: Mutex<VecDeque<ScriptEntry>>,
}

impl ScriptedClassifier {
    pub fn new(script: Script) -> Self {
        Self {
            entries: Mutex::new(script.entries.into()),
        }
    }

    /// Entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&self, _image: &PreparedImage) -> Result<Vec<Candidate>> {
        let entry = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let Some(entry) = entry else {
            return Ok(Vec::new());
        };

        if !entry.latency().is_zero() {
            std::thread::sleep(entry.latency());
        }
        if entry.unavailable {
            return Err(GestureError::ClassifierUnavailable {
                message: format!("scripted outage at {} ms", entry.at_ms),
            });
        }
        Ok(entry.candidates())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
