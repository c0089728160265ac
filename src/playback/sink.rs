use crate::error::{GestureError, Result};
use crate::gesture::ControlAction;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Receiver of playback intents.
///
/// The sink owns the real player state: it clamps volume and pitch and
/// decides whether an action can be honored. The control state machine only
/// asks the two questions it needs for level-set and one-shot bindings.
pub trait PlaybackIntentSink: Send + 'static {
    /// Apply one action. Errors are reported and never stop the pipeline.
    fn apply(&mut self, action: ControlAction) -> Result<()>;

    /// Whether a track follows the current one.
    fn has_next_track(&self) -> bool;

    /// Whether playback is currently running.
    fn is_playing(&self) -> bool;

    /// Called when an action was recognized but not applied
    /// (e.g. `NextTrack` at the end of the playlist).
    fn decline(&mut self, _action: ControlAction) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// An interaction recorded by [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Applied(ControlAction),
    Rejected(ControlAction),
    Declined(ControlAction),
}

/// Shared view of a [`RecordingSink`]'s history.
#[derive(Debug, Clone, Default)]
pub struct SinkLog {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl SinkLog {
    fn push(&self, call: SinkCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    /// Every call in order.
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Successfully applied actions in order.
    pub fn applied(&self) -> Vec<ControlAction> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Applied(action) => Some(action),
                _ => None,
            })
            .collect()
    }

    pub fn declined(&self) -> Vec<ControlAction> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Declined(action) => Some(action),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Records every intent for tests and library use.
///
/// Tracks a playing flag from Play/Pause/TogglePlayPause/NextTrack so that
/// level-set bindings behave like they would against a real player.
pub struct RecordingSink {
    log: SinkLog,
    has_next: Arc<AtomicBool>,
    playing: bool,
    reject: HashSet<ControlAction>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            log: SinkLog::default(),
            has_next: Arc::new(AtomicBool::new(true)),
            playing: false,
            reject: HashSet::new(),
        }
    }

    /// Set the answer to `has_next_track`.
    pub fn with_next_track(self, has_next: bool) -> Self {
        self.has_next.store(has_next, Ordering::SeqCst);
        self
    }

    pub fn playing(mut self) -> Self {
        self.playing = true;
        self
    }

    /// Make `apply` fail for the given action.
    pub fn rejecting(mut self, action: ControlAction) -> Self {
        self.reject.insert(action);
        self
    }

    /// History handle that stays valid after the sink is boxed and moved.
    pub fn log(&self) -> SinkLog {
        self.log.clone()
    }

    /// Switch for `has_next_track` that can be flipped from outside.
    pub fn next_track_switch(&self) -> Arc<AtomicBool> {
        self.has_next.clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackIntentSink for RecordingSink {
    fn apply(&mut self, action: ControlAction) -> Result<()> {
        if self.reject.contains(&action) {
            self.log.push(SinkCall::Rejected(action));
            return Err(GestureError::rejected(action, "rejected by recording sink"));
        }
        match action {
            ControlAction::Play | ControlAction::NextTrack => self.playing = true,
            ControlAction::Pause => self.playing = false,
            ControlAction::TogglePlayPause => self.playing = !self.playing,
            _ => {}
        }
        self.log.push(SinkCall::Applied(action));
        Ok(())
    }

    fn has_next_track(&self) -> bool {
        self.has_next.load(Ordering::SeqCst)
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn decline(&mut self, action: ControlAction) {
        self.log.push(SinkCall::Declined(action));
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
