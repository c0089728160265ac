//! Classifier submission and result normalization.
//!
//! Submission goes through a single-slot mailbox: while the worker is busy,
//! a newer frame evicts the one still waiting. Latency stays bounded by one
//! classification at the cost of skipping frames.

use crate::classifier::{Candidate, Classifier};
use crate::error::{GestureError, Result};
use crate::frame::PreparedImage;
use crate::gesture::{GestureLabel, GestureObservation};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// A prepared frame waiting for classification.
#[derive(Debug, Clone)]
pub struct Submission {
    pub image: PreparedImage,
    /// Capture time of the source frame.
    pub timestamp: Instant,
    pub sequence: u64,
}

impl Submission {
    pub fn new(image: PreparedImage, timestamp: Instant, sequence: u64) -> Self {
        Self {
            image,
            timestamp,
            sequence,
        }
    }
}

/// What happened to a submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The slot was empty; the frame waits for the worker.
    Queued,
    /// An older pending frame was dropped in favor of this one.
    Coalesced,
}

/// Producer side of the keep-latest classification slot.
pub struct ClassifierAdapter {
    slot_tx: Sender<Submission>,
    // Producer-held receiver, used only to evict stale frames.
    evict_rx: Receiver<Submission>,
    worker_alive: Arc<AtomicBool>,
    classifier: Arc<dyn Classifier>,
}

impl ClassifierAdapter {
    /// Creates the adapter and the receiver the classification worker drains.
    ///
    /// `classifier` is only probed for readiness here; the worker runs it.
    pub fn channel(classifier: Arc<dyn Classifier>) -> (Self, Receiver<Submission>) {
        let (slot_tx, slot_rx) = bounded(1);
        let adapter = Self {
            slot_tx,
            evict_rx: slot_rx.clone(),
            worker_alive: Arc::new(AtomicBool::new(true)),
            classifier,
        };
        (adapter, slot_rx)
    }

    /// Flag the worker clears when it stops; submissions fail afterwards.
    pub fn worker_flag(&self) -> Arc<AtomicBool> {
        self.worker_alive.clone()
    }

    /// Offers a frame to the classifier without blocking.
    pub fn submit(&self, submission: Submission) -> Result<SubmitOutcome> {
        if !self.worker_alive.load(Ordering::SeqCst) {
            return Err(unavailable("classification worker stopped"));
        }
        if !self.classifier.is_ready() {
            return Err(not_ready(self.classifier.as_ref()));
        }

        let mut outcome = SubmitOutcome::Queued;
        let mut pending = submission;
        loop {
            match self.slot_tx.try_send(pending) {
                Ok(()) => return Ok(outcome),
                Err(TrySendError::Full(back)) => {
                    // The worker may have taken the old frame in the meantime.
                    if self.evict_rx.try_recv().is_ok() {
                        outcome = SubmitOutcome::Coalesced;
                    }
                    pending = back;
                }
                Err(TrySendError::Disconnected(_)) => {
                    return Err(unavailable("classification slot closed"));
                }
            }
        }
    }

    /// Number of frames waiting in the slot (0 or 1).
    pub fn pending(&self) -> usize {
        self.slot_tx.len()
    }
}

fn unavailable(message: &str) -> GestureError {
    GestureError::ClassifierUnavailable {
        message: message.to_string(),
    }
}

fn not_ready(classifier: &dyn Classifier) -> GestureError {
    unavailable(&format!("classifier '{}' is not ready", classifier.name()))
}

/// Runs one classification and normalizes its result.
pub fn classify_submission(
    classifier: &dyn Classifier,
    submission: &Submission,
) -> Result<GestureObservation> {
    if !classifier.is_ready() {
        return Err(not_ready(classifier));
    }
    let candidates = classifier.classify(&submission.image)?;
    Ok(normalize(&candidates, submission.timestamp))
}

/// Picks the highest-scoring candidate (first wins ties) as the observation.
///
/// Unknown category names become [`GestureLabel::None`]; an empty list is
/// `None` with zero confidence. Scores are clamped to `[0, 1]`, NaN to 0.
pub fn normalize(candidates: &[Candidate], timestamp: Instant) -> GestureObservation {
    let mut best: Option<(&Candidate, f32)> = None;
    for candidate in candidates {
        let score = sanitize_score(candidate.score);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((candidate, score)) => GestureObservation::new(
            GestureLabel::from_category(&candidate.category),
            score,
            timestamp,
        ),
        None => GestureObservation::none(timestamp),
    }
}

fn sanitize_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
