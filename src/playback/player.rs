//! Reference player state.
//!
//! Models the app-side playback controller: volume steps, pitch, play state
//! and the playlist position. Human-readable status lines go to an optional
//! channel; a full or closed channel is ignored.

use crate::config::PlayerConfig;
use crate::error::{GestureError, Result};
use crate::gesture::ControlAction;
use crate::playback::playlist::{Playlist, Track};
use crate::playback::sink::PlaybackIntentSink;
use crossbeam_channel::Sender;

pub struct PlayerSink {
    playlist: Playlist,
    playing: bool,
    volume: u8,
    max_volume: u8,
    pitch: f32,
    min_pitch: f32,
    max_pitch: f32,
    pitch_step: f32,
    status_tx: Option<Sender<String>>,
}

impl PlayerSink {
    pub fn new(config: &PlayerConfig, playlist: Playlist) -> Self {
        Self {
            playlist,
            playing: false,
            volume: config.initial_volume.min(config.max_volume),
            max_volume: config.max_volume,
            pitch: config.initial_pitch.max(config.min_pitch).min(config.max_pitch),
            min_pitch: config.min_pitch,
            max_pitch: config.max_pitch,
            pitch_step: config.pitch_step,
            status_tx: None,
        }
    }

    pub fn with_status_sender(mut self, tx: Sender<String>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.playlist.current()
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    fn post(&self, message: String) {
        if let Some(ref tx) = self.status_tx
            && tx.try_send(message).is_err()
        {
            // Status is advisory; nobody listening is fine.
        }
    }

    fn play(&mut self) -> Result<()> {
        let title = match self.playlist.current() {
            Some(track) => track.title.clone(),
            None => return Err(GestureError::rejected(ControlAction::Play, "playlist is empty")),
        };
        self.playing = true;
        self.post(format!("Playing: {title}"));
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
        self.post("Playback paused".to_string());
    }

    fn step_volume(&mut self, up: bool) {
        self.volume = if up {
            self.volume.saturating_add(1).min(self.max_volume)
        } else {
            self.volume.saturating_sub(1)
        };
        self.post(format!("Volume: {}/{}", self.volume, self.max_volume));
    }

    fn step_pitch(&mut self, up: bool) {
        let delta = if up { self.pitch_step } else { -self.pitch_step };
        self.pitch = (self.pitch + delta).max(self.min_pitch).min(self.max_pitch);
        self.post(format!("Pitch: {:.2}", self.pitch));
    }

    fn next_track(&mut self) -> Result<()> {
        let title = match self.playlist.advance() {
            Some(track) => track.title.clone(),
            None => {
                return Err(GestureError::rejected(
                    ControlAction::NextTrack,
                    "already at the last track",
                ));
            }
        };
        // Switching always starts playback, even from paused.
        self.playing = true;
        self.post(format!("Switched to: {title}"));
        Ok(())
    }
}

impl PlaybackIntentSink for PlayerSink {
    fn apply(&mut self, action: ControlAction) -> Result<()> {
        match action {
            ControlAction::VolumeUp => self.step_volume(true),
            ControlAction::VolumeDown => self.step_volume(false),
            ControlAction::PitchUp => self.step_pitch(true),
            ControlAction::PitchDown => self.step_pitch(false),
            ControlAction::Play => self.play()?,
            ControlAction::Pause => self.pause(),
            ControlAction::TogglePlayPause => {
                if self.playing {
                    self.pause();
                } else {
                    self.play()?;
                }
            }
            ControlAction::NextTrack => self.next_track()?,
        }
        Ok(())
    }

    fn has_next_track(&self) -> bool {
        self.playlist.has_next()
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn decline(&mut self, action: ControlAction) {
        if action == ControlAction::NextTrack {
            self.post("Already at the last track".to_string());
        }
    }

    fn name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{Receiver, unbounded};

    fn player() -> (PlayerSink, Receiver<String>) {
        let (tx, rx) = unbounded();
        let sink = PlayerSink::new(&PlayerConfig::default(), Playlist::demo()).with_status_sender(tx);
        (sink, rx)
    }

    fn drain(rx: &Receiver<String>) -> Vec<String> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_volume_clamps_at_bounds() {
        let (mut sink, rx) = player();
        assert_eq!(sink.volume(), 7);
        for _ in 0..20 {
            sink.apply(ControlAction::VolumeUp).unwrap();
        }
        assert_eq!(sink.volume(), 15);
        for _ in 0..20 {
            sink.apply(ControlAction::VolumeDown).unwrap();
        }
        assert_eq!(sink.volume(), 0);
        assert_eq!(drain(&rx).last().map(String::as_str), Some("Volume: 0/15"));
    }

    #[test]
    fn test_pitch_steps_and_clamps() {
        let (mut sink, rx) = player();
        sink.apply(ControlAction::PitchUp).unwrap();
        assert_eq!(drain(&rx), vec!["Pitch: 1.20".to_string()]);

        for _ in 0..10 {
            sink.apply(ControlAction::PitchUp).unwrap();
        }
        assert_eq!(sink.pitch(), 2.0);
        for _ in 0..20 {
            sink.apply(ControlAction::PitchDown).unwrap();
        }
        assert_eq!(sink.pitch(), 0.4);
        assert_eq!(drain(&rx).last().map(String::as_str), Some("Pitch: 0.40"));
    }

    #[test]
    fn test_play_pause_toggle() {
        let (mut sink, _rx) = player();
        assert!(!sink.is_playing());
        sink.apply(ControlAction::TogglePlayPause).unwrap();
        assert!(sink.is_playing());
        sink.apply(ControlAction::Pause).unwrap();
        assert!(!sink.is_playing());
        sink.apply(ControlAction::Play).unwrap();
        assert!(sink.is_playing());
    }

    #[test]
    fn test_play_with_empty_playlist_is_rejected() {
        let mut sink = PlayerSink::new(&PlayerConfig::default(), Playlist::default());
        assert!(matches!(
            sink.apply(ControlAction::Play),
            Err(GestureError::SinkRejected {
                action: ControlAction::Play,
                ..
            })
        ));
        assert!(!sink.is_playing());
    }

    #[test]
    fn test_next_track_advances_and_plays() {
        let (mut sink, rx) = player();
        sink.apply(ControlAction::NextTrack).unwrap();
        assert!(sink.is_playing());
        assert_eq!(sink.current_track().map(|t| t.id.as_str()), Some("2"));
        assert_eq!(drain(&rx), vec!["Switched to: Song 2".to_string()]);
    }

    #[test]
    fn test_next_track_at_end_is_rejected() {
        let (mut sink, _rx) = player();
        for _ in 0..9 {
            sink.apply(ControlAction::NextTrack).unwrap();
        }
        assert!(!sink.has_next_track());
        assert!(matches!(
            sink.apply(ControlAction::NextTrack),
            Err(GestureError::SinkRejected {
                action: ControlAction::NextTrack,
                ..
            })
        ));
        assert_eq!(sink.current_track().map(|t| t.id.as_str()), Some("10"));
    }

    #[test]
    fn test_decline_next_track_posts_message() {
        let (mut sink, rx) = player();
        sink.decline(ControlAction::NextTrack);
        assert_eq!(drain(&rx), vec!["Already at the last track".to_string()]);
    }

    #[test]
    fn test_closed_status_channel_is_ignored() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut sink =
            PlayerSink::new(&PlayerConfig::default(), Playlist::demo()).with_status_sender(tx);
        sink.apply(ControlAction::VolumeUp).unwrap();
        assert_eq!(sink.volume(), 8);
    }
}
