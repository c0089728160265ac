//! Label stream debouncing.
//!
//! Turns the per-frame filtered label into edge events. There is no dwell
//! time: a single differing frame ends the current gesture.

use crate::gesture::{GestureLabel, StableGestureEvent};
use std::time::Instant;

/// One debouncing step.
///
/// Returns the new current label and the events to emit, in order. At most
/// two events come out (an `Ended` followed by a `Started`).
pub fn debounce(
    current: GestureLabel,
    label: GestureLabel,
    timestamp: Instant,
) -> (GestureLabel, Vec<StableGestureEvent>) {
    if label == current {
        let events = if label.is_none() {
            Vec::new()
        } else {
            vec![StableGestureEvent::sustained(label, timestamp)]
        };
        return (current, events);
    }

    let mut events = Vec::with_capacity(2);
    if !current.is_none() {
        events.push(StableGestureEvent::ended(current, timestamp));
    }
    if !label.is_none() {
        events.push(StableGestureEvent::started(label, timestamp));
    }
    (label, events)
}

/// Holds the current stable label between observations.
#[derive(Debug, Clone, Default)]
pub struct GestureDebouncer {
    current: GestureLabel,
}

impl GestureDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> GestureLabel {
        self.current
    }

    pub fn push(&mut self, label: GestureLabel, timestamp: Instant) -> Vec<StableGestureEvent> {
        let (next, events) = debounce(self.current, label, timestamp);
        self.current = next;
        events
    }

    /// Forgets the current label without emitting `Ended`.
    pub fn reset(&mut self) {
        self.current = GestureLabel::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::EventKind;

    fn kinds(events: &[StableGestureEvent]) -> Vec<(GestureLabel, EventKind)> {
        events.iter().map(|e| (e.label, e.kind)).collect()
    }

    #[test]
    fn test_first_label_starts() {
        let mut debouncer = GestureDebouncer::new();
        let events = debouncer.push(GestureLabel::ThumbUp, Instant::now());
        assert_eq!(kinds(&events), vec![(GestureLabel::ThumbUp, EventKind::Started)]);
        assert_eq!(debouncer.current(), GestureLabel::ThumbUp);
    }

    #[test]
    fn test_repeat_label_sustains() {
        let mut debouncer = GestureDebouncer::new();
        debouncer.push(GestureLabel::Victory, Instant::now());
        let events = debouncer.push(GestureLabel::Victory, Instant::now());
        assert_eq!(kinds(&events), vec![(GestureLabel::Victory, EventKind::Sustained)]);
    }

    #[test]
    fn test_sustained_none_is_silent() {
        let mut debouncer = GestureDebouncer::new();
        for _ in 0..5 {
            assert!(debouncer.push(GestureLabel::None, Instant::now()).is_empty());
        }
    }

    #[test]
    fn test_change_ends_before_start() {
        let mut debouncer = GestureDebouncer::new();
        debouncer.push(GestureLabel::ThumbUp, Instant::now());
        let events = debouncer.push(GestureLabel::ThumbDown, Instant::now());
        assert_eq!(
            kinds(&events),
            vec![
                (GestureLabel::ThumbUp, EventKind::Ended),
                (GestureLabel::ThumbDown, EventKind::Started),
            ]
        );
    }

    #[test]
    fn test_drop_to_none_only_ends() {
        let mut debouncer = GestureDebouncer::new();
        debouncer.push(GestureLabel::OpenPalm, Instant::now());
        let events = debouncer.push(GestureLabel::None, Instant::now());
        assert_eq!(kinds(&events), vec![(GestureLabel::OpenPalm, EventKind::Ended)]);
        assert_eq!(debouncer.current(), GestureLabel::None);
    }

    #[test]
    fn test_events_carry_observation_timestamp() {
        let now = Instant::now();
        let (_, events) = debounce(GestureLabel::None, GestureLabel::LoveSign, now);
        assert_eq!(events[0].timestamp, now);
    }

    #[test]
    fn test_every_start_is_ended_before_another_start() {
        // Arbitrary label walk; check the Started/Ended pairing holds throughout.
        let walk = [
            GestureLabel::ThumbUp,
            GestureLabel::ThumbUp,
            GestureLabel::None,
            GestureLabel::Victory,
            GestureLabel::ThumbDown,
            GestureLabel::ThumbDown,
            GestureLabel::None,
            GestureLabel::None,
            GestureLabel::LoveSign,
            GestureLabel::OpenPalm,
        ];
        let mut debouncer = GestureDebouncer::new();
        let mut active: Option<GestureLabel> = None;
        for label in walk {
            for event in debouncer.push(label, Instant::now()) {
                match event.kind {
                    EventKind::Started => {
                        assert!(active.is_none(), "start while {active:?} active");
                        active = Some(event.label);
                    }
                    EventKind::Sustained => assert_eq!(active, Some(event.label)),
                    EventKind::Ended => {
                        assert_eq!(active, Some(event.label));
                        active = None;
                    }
                }
            }
        }
        assert_eq!(active, Some(GestureLabel::OpenPalm));
    }

    #[test]
    fn test_reset_forgets_label() {
        let mut debouncer = GestureDebouncer::new();
        debouncer.push(GestureLabel::ClosedFist, Instant::now());
        debouncer.reset();
        let events = debouncer.push(GestureLabel::ClosedFist, Instant::now());
        assert_eq!(kinds(&events), vec![(GestureLabel::ClosedFist, EventKind::Started)]);
    }
}
