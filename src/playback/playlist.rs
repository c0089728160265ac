use serde::{Deserialize, Serialize};

/// Catalog entry. Only metadata; decoding is the real player's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub stream_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

/// Ordered tracks plus the current position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<Track>,
    current: Option<usize>,
}

impl Playlist {
    /// The first track (if any) becomes current.
    pub fn new(tracks: Vec<Track>) -> Self {
        let current = if tracks.is_empty() { None } else { Some(0) };
        Self { tracks, current }
    }

    /// Ten SoundHelix example tracks.
    pub fn demo() -> Self {
        let tracks = (1..=10)
            .map(|i| Track {
                id: i.to_string(),
                title: format!("Song {i}"),
                artist: "SoundHelix".to_string(),
                stream_url: format!("https://www.soundhelix.com/examples/mp3/SoundHelix-Song-{i}.mp3"),
                cover_url: None,
            })
            .collect();
        Self::new(tracks)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn has_next(&self) -> bool {
        self.current.is_some_and(|i| i + 1 < self.tracks.len())
    }

    /// Moves to the next track and returns it, or `None` at the end.
    pub fn advance(&mut self) -> Option<&Track> {
        if !self.has_next() {
            return None;
        }
        let next = self.current.map_or(0, |i| i + 1);
        self.current = Some(next);
        self.tracks.get(next)
    }

    /// Makes the track with `id` current.
    pub fn select(&mut self, id: &str) -> Option<&Track> {
        let index = self.tracks.iter().position(|t| t.id == id)?;
        self.current = Some(index);
        self.tracks.get(index)
    }
}
