use crate::defaults;
use crate::error::{GestureError, Result};
use crate::pipeline::PipelineConfig;
use crate::playback::{Playlist, Track};
use serde::{Deserialize, Serialize};
use std::path::Path;
#[cfg(feature = "cli")]
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineSettings,
    pub player: PlayerConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub playlist: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub target_size: u32,
    pub confidence_threshold: f32,
    pub repeat_interval_ms: u64,
    pub frame_interval_ms: u64,
    pub frame_buffer: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            target_size: defaults::TARGET_SIZE,
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            repeat_interval_ms: defaults::REPEAT_INTERVAL_MS,
            frame_interval_ms: defaults::FRAME_INTERVAL_MS,
            frame_buffer: defaults::FRAME_BUFFER,
        }
    }
}

/// Reference player limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub initial_volume: u8,
    pub max_volume: u8,
    pub initial_pitch: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub pitch_step: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_volume: defaults::INITIAL_VOLUME,
            max_volume: defaults::MAX_VOLUME,
            initial_pitch: defaults::INITIAL_PITCH,
            min_pitch: defaults::MIN_PITCH,
            max_pitch: defaults::MAX_PITCH,
            pitch_step: defaults::PITCH_STEP,
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> GestureError {
    GestureError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GestureError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                GestureError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(GestureError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply `GESTURECTL_*` environment overrides.
    ///
    /// Empty or unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("GESTURECTL_CONFIDENCE_THRESHOLD")
            && let Ok(threshold) = value.trim().parse::<f32>()
        {
            self.pipeline.confidence_threshold = threshold;
        }

        if let Ok(value) = std::env::var("GESTURECTL_REPEAT_INTERVAL_MS")
            && let Ok(ms) = value.trim().parse::<u64>()
        {
            self.pipeline.repeat_interval_ms = ms;
        }

        if let Ok(value) = std::env::var("GESTURECTL_TARGET_SIZE")
            && let Ok(size) = value.trim().parse::<u32>()
        {
            self.pipeline.target_size = size;
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        if !(0.0..=1.0).contains(&p.confidence_threshold) {
            return Err(invalid(
                "pipeline.confidence_threshold",
                format!("{} is outside [0, 1]", p.confidence_threshold),
            ));
        }
        if p.target_size == 0 {
            return Err(invalid("pipeline.target_size", "must be positive"));
        }
        if p.repeat_interval_ms == 0 {
            return Err(invalid("pipeline.repeat_interval_ms", "must be positive"));
        }
        if p.frame_buffer == 0 {
            return Err(invalid("pipeline.frame_buffer", "must be positive"));
        }

        let player = &self.player;
        if player.max_volume == 0 {
            return Err(invalid("player.max_volume", "must be positive"));
        }
        if player.initial_volume > player.max_volume {
            return Err(invalid(
                "player.initial_volume",
                format!(
                    "{} exceeds max_volume {}",
                    player.initial_volume, player.max_volume
                ),
            ));
        }
        if player.min_pitch.is_nan()
            || player.min_pitch <= 0.0
            || player.min_pitch > player.max_pitch
        {
            return Err(invalid(
                "player.min_pitch",
                format!(
                    "need 0 < min_pitch <= max_pitch, got {} and {}",
                    player.min_pitch, player.max_pitch
                ),
            ));
        }
        if !(player.min_pitch..=player.max_pitch).contains(&player.initial_pitch) {
            return Err(invalid(
                "player.initial_pitch",
                format!(
                    "{} is outside [{}, {}]",
                    player.initial_pitch, player.min_pitch, player.max_pitch
                ),
            ));
        }
        if player.pitch_step.is_nan() || player.pitch_step <= 0.0 {
            return Err(invalid("player.pitch_step", "must be positive"));
        }

        for (index, track) in self.playlist.iter().enumerate() {
            if track.stream_url.trim().is_empty() {
                return Err(invalid(
                    &format!("playlist[{index}].stream_url"),
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Pipeline settings with CLI-only knobs left at their defaults.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            target_size: self.pipeline.target_size,
            confidence_threshold: self.pipeline.confidence_threshold,
            repeat_interval: Duration::from_millis(self.pipeline.repeat_interval_ms),
            frame_interval: Duration::from_millis(self.pipeline.frame_interval_ms),
            frame_buffer: self.pipeline.frame_buffer,
            ..PipelineConfig::default()
        }
    }

    /// Configured tracks, or the demo catalog when none are listed.
    pub fn playlist(&self) -> Playlist {
        if self.playlist.is_empty() {
            Playlist::demo()
        } else {
            Playlist::new(self.playlist.clone())
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GestureError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// `$XDG_CONFIG_HOME/gesturectl/config.toml`
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gesturectl").join("config.toml"))
    }
}
