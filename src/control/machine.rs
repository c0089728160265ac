//! Continuous-action state machine.
//!
//! Debounced gesture events come in, playback intents go out. Holding a
//! repeatable gesture fires its action immediately and then on every repeat
//! tick until the gesture ends or another one starts.
//!
//! The decision logic lives in the pure [`transition`] function.
//! [`ControlStateMachine`] executes its effects against a scheduler and a
//! sink and owns the single live repeat task.

use crate::control::scheduler::{RepeatScheduler, TaskHandle};
use crate::defaults;
use crate::error::GestureError;
use crate::gesture::{ControlAction, EventKind, GestureLabel, StableGestureEvent};
use crate::playback::PlaybackIntentSink;
use std::fmt;
use std::time::Duration;

/// What a gesture does when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Fire now and keep firing while held.
    Repeat(ControlAction),
    /// Play unless already playing.
    EnsurePlaying,
    /// Pause unless already paused.
    EnsurePaused,
    /// Fire once per start.
    OneShot(ControlAction),
    Unbound,
}

pub fn binding(label: GestureLabel) -> Binding {
    match label {
        GestureLabel::ThumbUp => Binding::Repeat(ControlAction::VolumeUp),
        GestureLabel::ThumbDown => Binding::Repeat(ControlAction::VolumeDown),
        GestureLabel::PointingUp => Binding::Repeat(ControlAction::PitchUp),
        GestureLabel::Victory => Binding::Repeat(ControlAction::PitchDown),
        GestureLabel::OpenPalm => Binding::EnsurePlaying,
        GestureLabel::ClosedFist => Binding::EnsurePaused,
        GestureLabel::LoveSign => Binding::OneShot(ControlAction::NextTrack),
        GestureLabel::None => Binding::Unbound,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Idle,
    Repeating {
        label: GestureLabel,
        action: ControlAction,
    },
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlState::Idle => f.write_str("idle"),
            ControlState::Repeating { label, action } => {
                write!(f, "repeating {action} ({label})")
            }
        }
    }
}

/// Sink answers consulted by [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStatus {
    pub playing: bool,
    pub has_next_track: bool,
}

/// Side effect requested by a transition, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    CancelRepeat,
    Apply(ControlAction),
    StartRepeat(ControlAction),
    Decline(ControlAction),
}

/// Pure transition function. Total over every state/event pair.
pub fn transition(
    state: ControlState,
    event: &StableGestureEvent,
    status: PlaybackStatus,
) -> (ControlState, Vec<Effect>) {
    let repeating = matches!(state, ControlState::Repeating { .. });

    match event.kind {
        EventKind::Sustained => (state, Vec::new()),
        EventKind::Ended => match state {
            ControlState::Repeating { label, .. } if label == event.label => {
                (ControlState::Idle, vec![Effect::CancelRepeat])
            }
            _ => (state, Vec::new()),
        },
        EventKind::Started => {
            let mut effects = Vec::with_capacity(3);
            if repeating {
                effects.push(Effect::CancelRepeat);
            }
            let next = match binding(event.label) {
                Binding::Repeat(action) => {
                    effects.push(Effect::Apply(action));
                    effects.push(Effect::StartRepeat(action));
                    ControlState::Repeating {
                        label: event.label,
                        action,
                    }
                }
                Binding::EnsurePlaying => {
                    if !status.playing {
                        effects.push(Effect::Apply(ControlAction::Play));
                    }
                    ControlState::Idle
                }
                Binding::EnsurePaused => {
                    if status.playing {
                        effects.push(Effect::Apply(ControlAction::Pause));
                    }
                    ControlState::Idle
                }
                Binding::OneShot(ControlAction::NextTrack) if !status.has_next_track => {
                    effects.push(Effect::Decline(ControlAction::NextTrack));
                    ControlState::Idle
                }
                Binding::OneShot(action) => {
                    effects.push(Effect::Apply(action));
                    ControlState::Idle
                }
                Binding::Unbound => ControlState::Idle,
            };
            (next, effects)
        }
    }
}

/// The repeating action currently owned by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTask {
    pub handle: TaskHandle,
    pub action: ControlAction,
}

/// Result of handing one action to the sink.
#[derive(Debug)]
pub enum Dispatch {
    Applied(ControlAction),
    Rejected(ControlAction, GestureError),
    /// Recognized but not applicable; the sink was told via `decline`.
    Declined(ControlAction),
}

impl Dispatch {
    pub fn action(&self) -> ControlAction {
        match self {
            Dispatch::Applied(action)
            | Dispatch::Rejected(action, _)
            | Dispatch::Declined(action) => *action,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Dispatch::Applied(_))
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Applied(action) => write!(f, "{action}"),
            Dispatch::Rejected(_, e) => write!(f, "{e}"),
            Dispatch::Declined(action) => write!(f, "{action} declined"),
        }
    }
}

pub struct ControlStateMachine {
    state: ControlState,
    task: Option<RepeatTask>,
    scheduler: Box<dyn RepeatScheduler>,
    sink: Box<dyn PlaybackIntentSink>,
    interval: Duration,
}

impl ControlStateMachine {
    pub fn new(scheduler: Box<dyn RepeatScheduler>, sink: Box<dyn PlaybackIntentSink>) -> Self {
        Self {
            state: ControlState::Idle,
            task: None,
            scheduler,
            sink,
            interval: Duration::from_millis(defaults::REPEAT_INTERVAL_MS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn active_task(&self) -> Option<RepeatTask> {
        self.task
    }

    pub fn sink(&self) -> &dyn PlaybackIntentSink {
        self.sink.as_ref()
    }

    fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            playing: self.sink.is_playing(),
            has_next_track: self.sink.has_next_track(),
        }
    }

    /// Handles one debounced event, returning what was sent to the sink.
    pub fn handle(&mut self, event: &StableGestureEvent) -> Vec<Dispatch> {
        let (next, effects) = transition(self.state, event, self.status());
        let mut dispatched = Vec::new();

        for effect in effects {
            match effect {
                Effect::CancelRepeat => self.cancel_task(),
                Effect::Apply(action) => dispatched.push(self.dispatch(action)),
                Effect::StartRepeat(action) => {
                    self.cancel_task();
                    let handle = self.scheduler.start(self.interval, action);
                    self.task = Some(RepeatTask { handle, action });
                }
                Effect::Decline(action) => {
                    self.sink.decline(action);
                    dispatched.push(Dispatch::Declined(action));
                }
            }
        }

        self.state = next;
        dispatched
    }

    /// Handles a repeat tick. Ticks from cancelled tasks are discarded.
    pub fn on_tick(&mut self, handle: TaskHandle) -> Option<Dispatch> {
        let task = self.task.filter(|task| task.handle == handle)?;
        Some(self.dispatch(task.action))
    }

    /// Cancels any repeat task and returns to `Idle`.
    pub fn reset(&mut self) {
        self.cancel_task();
        self.state = ControlState::Idle;
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            self.scheduler.cancel(task.handle);
        }
    }

    fn dispatch(&mut self, action: ControlAction) -> Dispatch {
        match self.sink.apply(action) {
            Ok(()) => Dispatch::Applied(action),
            Err(e) => Dispatch::Rejected(action, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::scheduler::ManualScheduler;
    use crate::playback::{RecordingSink, SinkLog};
    use std::time::Instant;

    const INTERVAL: Duration = Duration::from_millis(300);

    fn started(label: GestureLabel) -> StableGestureEvent {
        StableGestureEvent::started(label, Instant::now())
    }

    fn ended(label: GestureLabel) -> StableGestureEvent {
        StableGestureEvent::ended(label, Instant::now())
    }

    fn sustained(label: GestureLabel) -> StableGestureEvent {
        StableGestureEvent::sustained(label, Instant::now())
    }

    fn machine_with(sink: RecordingSink) -> (ControlStateMachine, ManualScheduler, SinkLog) {
        let scheduler = ManualScheduler::new();
        let log = sink.log();
        let machine = ControlStateMachine::new(Box::new(scheduler.clone()), Box::new(sink))
            .with_interval(INTERVAL);
        (machine, scheduler, log)
    }

    fn run_ticks(machine: &mut ControlStateMachine, scheduler: &ManualScheduler, by: Duration) {
        for (_, handle) in scheduler.advance(by) {
            machine.on_tick(handle);
        }
    }

    fn assert_single_live_task(scheduler: &ManualScheduler) {
        let live = scheduler.created() - scheduler.cancelled();
        assert!(live <= 1, "{live} live repeat tasks");
        assert_eq!(live, scheduler.live());
    }

    #[test]
    fn test_bindings() {
        assert_eq!(
            binding(GestureLabel::ThumbUp),
            Binding::Repeat(ControlAction::VolumeUp)
        );
        assert_eq!(
            binding(GestureLabel::Victory),
            Binding::Repeat(ControlAction::PitchDown)
        );
        assert_eq!(binding(GestureLabel::OpenPalm), Binding::EnsurePlaying);
        assert_eq!(binding(GestureLabel::ClosedFist), Binding::EnsurePaused);
        assert_eq!(
            binding(GestureLabel::LoveSign),
            Binding::OneShot(ControlAction::NextTrack)
        );
        assert_eq!(binding(GestureLabel::None), Binding::Unbound);
    }

    #[test]
    fn test_transition_start_repeatable_from_idle() {
        let (state, effects) = transition(
            ControlState::Idle,
            &started(GestureLabel::ThumbUp),
            PlaybackStatus::default(),
        );
        assert_eq!(
            state,
            ControlState::Repeating {
                label: GestureLabel::ThumbUp,
                action: ControlAction::VolumeUp
            }
        );
        assert_eq!(
            effects,
            vec![
                Effect::Apply(ControlAction::VolumeUp),
                Effect::StartRepeat(ControlAction::VolumeUp)
            ]
        );
    }

    #[test]
    fn test_transition_replaces_repeat() {
        let state = ControlState::Repeating {
            label: GestureLabel::ThumbUp,
            action: ControlAction::VolumeUp,
        };
        let (next, effects) = transition(
            state,
            &started(GestureLabel::PointingUp),
            PlaybackStatus::default(),
        );
        assert_eq!(effects[0], Effect::CancelRepeat);
        assert_eq!(
            next,
            ControlState::Repeating {
                label: GestureLabel::PointingUp,
                action: ControlAction::PitchUp
            }
        );
    }

    #[test]
    fn test_transition_sustained_is_noop() {
        let state = ControlState::Repeating {
            label: GestureLabel::Victory,
            action: ControlAction::PitchDown,
        };
        let (next, effects) = transition(
            state,
            &sustained(GestureLabel::Victory),
            PlaybackStatus::default(),
        );
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_transition_ended_other_label_is_noop() {
        let state = ControlState::Repeating {
            label: GestureLabel::ThumbDown,
            action: ControlAction::VolumeDown,
        };
        let (next, effects) =
            transition(state, &ended(GestureLabel::ThumbUp), PlaybackStatus::default());
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_transition_level_set_respects_status() {
        let playing = PlaybackStatus {
            playing: true,
            has_next_track: true,
        };
        let paused = PlaybackStatus::default();

        let (_, effects) = transition(ControlState::Idle, &started(GestureLabel::OpenPalm), playing);
        assert!(effects.is_empty());
        let (_, effects) = transition(ControlState::Idle, &started(GestureLabel::OpenPalm), paused);
        assert_eq!(effects, vec![Effect::Apply(ControlAction::Play)]);

        let (_, effects) =
            transition(ControlState::Idle, &started(GestureLabel::ClosedFist), paused);
        assert!(effects.is_empty());
        let (_, effects) =
            transition(ControlState::Idle, &started(GestureLabel::ClosedFist), playing);
        assert_eq!(effects, vec![Effect::Apply(ControlAction::Pause)]);
    }

    #[test]
    fn test_transition_love_sign_without_next_declines() {
        let (state, effects) = transition(
            ControlState::Idle,
            &started(GestureLabel::LoveSign),
            PlaybackStatus::default(),
        );
        assert_eq!(state, ControlState::Idle);
        assert_eq!(effects, vec![Effect::Decline(ControlAction::NextTrack)]);
    }

    #[test]
    fn test_transition_total_over_all_pairs() {
        let states = [
            ControlState::Idle,
            ControlState::Repeating {
                label: GestureLabel::ThumbUp,
                action: ControlAction::VolumeUp,
            },
        ];
        for state in states {
            for label in GestureLabel::ALL {
                for event in [started(label), sustained(label), ended(label)] {
                    for playing in [false, true] {
                        let status = PlaybackStatus {
                            playing,
                            has_next_track: !playing,
                        };
                        let (_, effects) = transition(state, &event, status);
                        let starts = effects
                            .iter()
                            .filter(|e| matches!(e, Effect::StartRepeat(_)))
                            .count();
                        assert!(starts <= 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_hold_thumb_up_repeats_volume_up() {
        let (mut machine, scheduler, log) = machine_with(RecordingSink::new());
        machine.handle(&started(GestureLabel::ThumbUp));
        assert_eq!(log.applied(), vec![ControlAction::VolumeUp]);

        run_ticks(&mut machine, &scheduler, Duration::from_millis(950));
        assert_eq!(log.applied(), vec![ControlAction::VolumeUp; 4]);
        assert_single_live_task(&scheduler);
    }

    #[test]
    fn test_thumb_up_none_thumb_down_scenario() {
        let (mut machine, scheduler, log) = machine_with(RecordingSink::new());

        machine.handle(&started(GestureLabel::ThumbUp));
        run_ticks(&mut machine, &scheduler, Duration::from_millis(100));
        machine.handle(&sustained(GestureLabel::ThumbUp));
        run_ticks(&mut machine, &scheduler, Duration::from_millis(100));
        machine.handle(&ended(GestureLabel::ThumbUp));
        assert_eq!(machine.state(), ControlState::Idle);
        assert_eq!(scheduler.live(), 0);

        run_ticks(&mut machine, &scheduler, Duration::from_millis(100));
        machine.handle(&started(GestureLabel::ThumbDown));
        run_ticks(&mut machine, &scheduler, Duration::from_millis(100));

        assert_eq!(
            log.applied(),
            vec![ControlAction::VolumeUp, ControlAction::VolumeDown]
        );
        assert_eq!(scheduler.created(), 2);
        assert_eq!(scheduler.cancelled(), 1);
        assert_single_live_task(&scheduler);
    }

    #[test]
    fn test_love_sign_without_next_track() {
        let (mut machine, scheduler, log) =
            machine_with(RecordingSink::new().with_next_track(false));
        let dispatched = machine.handle(&started(GestureLabel::LoveSign));

        assert_eq!(dispatched.len(), 1);
        assert!(matches!(
            dispatched[0],
            Dispatch::Declined(ControlAction::NextTrack)
        ));
        assert!(log.applied().is_empty());
        assert_eq!(log.declined(), vec![ControlAction::NextTrack]);
        assert_eq!(machine.state(), ControlState::Idle);
        assert_eq!(scheduler.created(), 0);
    }

    #[test]
    fn test_love_sign_with_next_track_fires_once() {
        let (mut machine, scheduler, log) = machine_with(RecordingSink::new());
        machine.handle(&started(GestureLabel::LoveSign));
        machine.handle(&sustained(GestureLabel::LoveSign));
        run_ticks(&mut machine, &scheduler, Duration::from_secs(2));
        assert_eq!(log.applied(), vec![ControlAction::NextTrack]);
    }

    #[test]
    fn test_rapid_alternation_keeps_one_task() {
        let (mut machine, scheduler, log) = machine_with(RecordingSink::new());
        let labels = [
            GestureLabel::ThumbUp,
            GestureLabel::Victory,
            GestureLabel::ThumbUp,
            GestureLabel::PointingUp,
            GestureLabel::ThumbDown,
        ];
        let mut previous: Option<GestureLabel> = None;
        for label in labels {
            if let Some(prev) = previous {
                machine.handle(&ended(prev));
            }
            machine.handle(&started(label));
            run_ticks(&mut machine, &scheduler, Duration::from_millis(50));
            assert_single_live_task(&scheduler);
            previous = Some(label);
        }

        assert_eq!(log.applied().len(), labels.len());
        assert_eq!(scheduler.live(), 1);
        assert_eq!(
            scheduler.live_actions(),
            vec![ControlAction::VolumeDown]
        );
    }

    #[test]
    fn test_stale_tick_is_discarded() {
        let (mut machine, scheduler, log) = machine_with(RecordingSink::new());
        machine.handle(&started(GestureLabel::PointingUp));
        let stale = machine.active_task().map(|t| t.handle);
        machine.handle(&ended(GestureLabel::PointingUp));

        let stale = stale.unwrap();
        assert!(machine.on_tick(stale).is_none());
        run_ticks(&mut machine, &scheduler, Duration::from_secs(1));
        assert_eq!(log.applied(), vec![ControlAction::PitchUp]);
    }

    #[test]
    fn test_started_level_set_cancels_repeat() {
        let (mut machine, scheduler, log) = machine_with(RecordingSink::new());
        machine.handle(&started(GestureLabel::ThumbUp));
        machine.handle(&started(GestureLabel::OpenPalm));
        assert_eq!(machine.state(), ControlState::Idle);
        assert_eq!(scheduler.live(), 0);
        assert_eq!(
            log.applied(),
            vec![ControlAction::VolumeUp, ControlAction::Play]
        );

        // Already playing: a second open palm does nothing.
        machine.handle(&started(GestureLabel::OpenPalm));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_closed_fist_pauses_only_when_playing() {
        let (mut machine, _scheduler, log) = machine_with(RecordingSink::new());
        machine.handle(&started(GestureLabel::ClosedFist));
        assert!(log.is_empty());

        let (mut machine, _scheduler, log) = machine_with(RecordingSink::new().playing());
        machine.handle(&started(GestureLabel::ClosedFist));
        assert_eq!(log.applied(), vec![ControlAction::Pause]);
    }

    #[test]
    fn test_rejection_keeps_repeating() {
        let (mut machine, scheduler, log) =
            machine_with(RecordingSink::new().rejecting(ControlAction::VolumeUp));
        let dispatched = machine.handle(&started(GestureLabel::ThumbUp));
        assert!(matches!(
            dispatched[0],
            Dispatch::Rejected(ControlAction::VolumeUp, GestureError::SinkRejected { .. })
        ));
        assert_eq!(scheduler.live(), 1);
        run_ticks(&mut machine, &scheduler, INTERVAL);
        assert_eq!(log.len(), 2);
        assert!(log.applied().is_empty());
    }

    #[test]
    fn test_reset_cancels_task() {
        let (mut machine, scheduler, _log) = machine_with(RecordingSink::new());
        machine.handle(&started(GestureLabel::ThumbDown));
        machine.reset();
        assert_eq!(machine.state(), ControlState::Idle);
        assert!(machine.active_task().is_none());
        assert_eq!(scheduler.live(), 0);
    }

    #[test]
    fn test_dispatch_display() {
        assert_eq!(Dispatch::Applied(ControlAction::PitchUp).to_string(), "pitch-up");
        assert_eq!(
            Dispatch::Declined(ControlAction::NextTrack).to_string(),
            "next-track declined"
        );
    }
}
