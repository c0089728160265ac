//! Core data model shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Hand pose recognized by the classifier.
///
/// `None` is a regular value meaning "no recognizable gesture", not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    ThumbUp,
    ThumbDown,
    OpenPalm,
    ClosedFist,
    PointingUp,
    Victory,
    LoveSign,
    #[default]
    None,
}

impl GestureLabel {
    /// All labels, `None` last.
    pub const ALL: [GestureLabel; 8] = [
        GestureLabel::ThumbUp,
        GestureLabel::ThumbDown,
        GestureLabel::OpenPalm,
        GestureLabel::ClosedFist,
        GestureLabel::PointingUp,
        GestureLabel::Victory,
        GestureLabel::LoveSign,
        GestureLabel::None,
    ];

    /// Maps a classifier category name to a label.
    ///
    /// Matching is case-insensitive; unknown names map to [`GestureLabel::None`].
    pub fn from_category(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "thumb_up" => GestureLabel::ThumbUp,
            "thumb_down" => GestureLabel::ThumbDown,
            "open_palm" => GestureLabel::OpenPalm,
            "closed_fist" => GestureLabel::ClosedFist,
            "pointing_up" => GestureLabel::PointingUp,
            "victory" => GestureLabel::Victory,
            "iloveyou" => GestureLabel::LoveSign,
            _ => GestureLabel::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::ThumbUp => "thumb-up",
            GestureLabel::ThumbDown => "thumb-down",
            GestureLabel::OpenPalm => "open-palm",
            GestureLabel::ClosedFist => "closed-fist",
            GestureLabel::PointingUp => "pointing-up",
            GestureLabel::Victory => "victory",
            GestureLabel::LoveSign => "love-sign",
            GestureLabel::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, GestureLabel::None)
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureObservation {
    pub label: GestureLabel,
    /// Classifier score in `[0, 1]`.
    pub confidence: f32,
    /// Capture time of the frame this observation was classified from.
    pub timestamp: Instant,
}

impl GestureObservation {
    pub fn new(label: GestureLabel, confidence: f32, timestamp: Instant) -> Self {
        Self {
            label,
            confidence,
            timestamp,
        }
    }

    /// The implicit observation used when no classification could be made.
    pub fn none(timestamp: Instant) -> Self {
        Self::new(GestureLabel::None, 0.0, timestamp)
    }
}

/// Lifecycle phase of a debounced gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    Sustained,
    Ended,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Started => "started",
            EventKind::Sustained => "sustained",
            EventKind::Ended => "ended",
        })
    }
}

/// Debounced gesture transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableGestureEvent {
    pub label: GestureLabel,
    pub kind: EventKind,
    pub timestamp: Instant,
}

impl StableGestureEvent {
    pub fn started(label: GestureLabel, timestamp: Instant) -> Self {
        Self {
            label,
            kind: EventKind::Started,
            timestamp,
        }
    }

    pub fn sustained(label: GestureLabel, timestamp: Instant) -> Self {
        Self {
            label,
            kind: EventKind::Sustained,
            timestamp,
        }
    }

    pub fn ended(label: GestureLabel, timestamp: Instant) -> Self {
        Self {
            label,
            kind: EventKind::Ended,
            timestamp,
        }
    }
}

impl fmt::Display for StableGestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.kind)
    }
}

/// Discrete playback intent handed to the playback sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    VolumeUp,
    VolumeDown,
    PitchUp,
    PitchDown,
    TogglePlayPause,
    Play,
    Pause,
    NextTrack,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::VolumeUp => "volume-up",
            ControlAction::VolumeDown => "volume-down",
            ControlAction::PitchUp => "pitch-up",
            ControlAction::PitchDown => "pitch-down",
            ControlAction::TogglePlayPause => "toggle-play-pause",
            ControlAction::Play => "play",
            ControlAction::Pause => "pause",
            ControlAction::NextTrack => "next-track",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_category_known_names() {
        assert_eq!(GestureLabel::from_category("Thumb_Up"), GestureLabel::ThumbUp);
        assert_eq!(
            GestureLabel::from_category("thumb_down"),
            GestureLabel::ThumbDown
        );
        assert_eq!(GestureLabel::from_category("Open_Palm"), GestureLabel::OpenPalm);
        assert_eq!(
            GestureLabel::from_category("CLOSED_FIST"),
            GestureLabel::ClosedFist
        );
        assert_eq!(
            GestureLabel::from_category("Pointing_Up"),
            GestureLabel::PointingUp
        );
        assert_eq!(GestureLabel::from_category("Victory"), GestureLabel::Victory);
        assert_eq!(GestureLabel::from_category("ILoveYou"), GestureLabel::LoveSign);
    }

    #[test]
    fn test_from_category_unknown_maps_to_none() {
        assert_eq!(GestureLabel::from_category("None"), GestureLabel::None);
        assert_eq!(GestureLabel::from_category(""), GestureLabel::None);
        assert_eq!(GestureLabel::from_category("wave"), GestureLabel::None);
    }

    #[test]
    fn test_from_category_trims_whitespace() {
        assert_eq!(GestureLabel::from_category(" victory\n"), GestureLabel::Victory);
    }

    #[test]
    fn test_label_default_is_none() {
        assert!(GestureLabel::default().is_none());
        assert!(!GestureLabel::ThumbUp.is_none());
    }

    #[test]
    fn test_all_labels_have_distinct_names() {
        let mut names: Vec<&str> = GestureLabel::ALL.iter().map(|l| l.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), GestureLabel::ALL.len());
    }

    #[test]
    fn test_label_serde_snake_case() {
        let json = serde_json::to_string(&GestureLabel::LoveSign).unwrap();
        assert_eq!(json, "\"love_sign\"");
        let back: GestureLabel = serde_json::from_str("\"pointing_up\"").unwrap();
        assert_eq!(back, GestureLabel::PointingUp);
    }

    #[test]
    fn test_none_observation_has_zero_confidence() {
        let now = Instant::now();
        let obs = GestureObservation::none(now);
        assert_eq!(obs.label, GestureLabel::None);
        assert_eq!(obs.confidence, 0.0);
        assert_eq!(obs.timestamp, now);
    }

    #[test]
    fn test_event_display() {
        let event = StableGestureEvent::started(GestureLabel::ThumbUp, Instant::now());
        assert_eq!(event.to_string(), "thumb-up started");
    }

    #[test]
    fn test_action_display() {
        assert_eq!(ControlAction::VolumeUp.to_string(), "volume-up");
        assert_eq!(ControlAction::TogglePlayPause.to_string(), "toggle-play-pause");
    }
}
