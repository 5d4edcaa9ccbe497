use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Overrides the `ffmpeg` found on `PATH`
    pub ffmpeg_path: Option<PathBuf>,
    /// Overrides the `ffprobe` found on `PATH`
    pub ffprobe_path: Option<PathBuf>,
    /// Pause after each written frame, approximating real-time playback
    pub frame_delay_ms: u64,
    /// Poll interval while paused
    pub pause_poll_ms: u64,
    pub preview_width: u32,
    pub preview_height: u32,
    pub jpeg_quality: u8,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            frame_delay_ms: 40,
            pause_poll_ms: 100,
            preview_width: 640,
            preview_height: 360,
            jpeg_quality: 95,
        }
    }
}

impl ExtractorConfig {
    /// Load the optional config file. The file is only ever read, never written.
    /// Unreadable or malformed files fall back to defaults.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!("No config file at {}, using defaults", config_path.display());
            Self::default()
        }
    }

    pub fn load_from(config_path: &Path) -> Self {
        let content = match std::fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read config file at {}: {}, using defaults", config_path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Self>(&content) {
            Ok(config) => {
                log::info!("Loaded config from {}", config_path.display());
                config.sanitized()
            }
            Err(e) => {
                log::warn!("Config file {} has issues ({}), using defaults", config_path.display(), e);
                Self::default()
            }
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("frame-extractor")
            .join("config.json")
    }

    pub fn sanitized(mut self) -> Self {
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self.preview_width = self.preview_width.max(1);
        self.preview_height = self.preview_height.max(1);
        self
    }

    pub fn ffmpeg(&self) -> PathBuf {
        self.ffmpeg_path.clone().unwrap_or_else(|| PathBuf::from("ffmpeg"))
    }

    pub fn ffprobe(&self) -> PathBuf {
        self.ffprobe_path.clone().unwrap_or_else(|| PathBuf::from("ffprobe"))
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }
}
