use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, RetimeError};

// Default values for the stretch section
fn default_min_factor() -> f64 {
    0.5
}

fn default_max_factor() -> f64 {
    2.0
}

fn default_fine_tolerance() -> f64 {
    0.01
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub stretch: StretchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
    /// Additional output options for the stretch command
    /// Common options: ["-c:a", "pcm_s16le"] or ["-b:a", "192k"]
    #[serde(default)]
    pub stretch_options: Vec<String>,
    /// Kill ffmpeg/ffprobe if they run longer than this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StretchConfig {
    /// Lowest overall factor allowed (slowest playback)
    #[serde(default = "default_min_factor")]
    pub min_factor: f64,
    /// Highest overall factor allowed (fastest playback)
    #[serde(default = "default_max_factor")]
    pub max_factor: f64,
    /// Absolute distance from 1.0 under which the audio is left untouched
    #[serde(default = "default_fine_tolerance")]
    pub fine_tolerance: f64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            stretch_options: vec![
                // Example options users can customize:
                // "-c:a".to_string(), "pcm_s16le".to_string(),  // Keep WAV output uncompressed
                // "-b:a".to_string(), "192k".to_string(),       // Bitrate for lossy containers
            ],
            process_timeout_secs: None,
        }
    }
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            min_factor: default_min_factor(),
            max_factor: default_max_factor(),
            fine_tolerance: default_fine_tolerance(),
        }
    }
}

impl StretchConfig {
    pub fn validate(&self) -> Result<()> {
        let values = [self.min_factor, self.max_factor, self.fine_tolerance];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RetimeError::Config("stretch values must be finite numbers".to_string()));
        }
        if self.min_factor <= 0.0 {
            return Err(RetimeError::Config(format!(
                "min_factor must be positive, got {}",
                self.min_factor
            )));
        }
        if self.min_factor > self.max_factor {
            return Err(RetimeError::Config(format!(
                "min_factor ({}) is greater than max_factor ({})",
                self.min_factor, self.max_factor
            )));
        }
        if self.fine_tolerance < 0.0 {
            return Err(RetimeError::Config(format!(
                "fine_tolerance must not be negative, got {}",
                self.fine_tolerance
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RetimeError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| RetimeError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RetimeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RetimeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.stretch.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.stretch.min_factor, 0.5);
        assert_eq!(config.stretch.max_factor, 2.0);
        assert_eq!(config.stretch.fine_tolerance, 0.01);
        assert_eq!(config.media.ffmpeg_path, "ffmpeg");
        assert_eq!(config.media.ffprobe_path, "ffprobe");
        assert!(config.media.process_timeout_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[stretch]\nmax_factor = 1.1\n").unwrap();
        assert_eq!(config.stretch.max_factor, 1.1);
        assert_eq!(config.stretch.min_factor, 0.5);
        assert_eq!(config.media.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_validation_rejects_bad_bounds() {
        let mut stretch = StretchConfig::default();
        stretch.min_factor = 0.0;
        assert!(stretch.validate().is_err());

        let mut stretch = StretchConfig::default();
        stretch.min_factor = 1.5;
        stretch.max_factor = 1.2;
        assert!(stretch.validate().is_err());

        let mut stretch = StretchConfig::default();
        stretch.fine_tolerance = -0.1;
        assert!(stretch.validate().is_err());

        let mut stretch = StretchConfig::default();
        stretch.max_factor = f64::INFINITY;
        assert!(stretch.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retime.toml");

        let mut config = Config::default();
        config.media.process_timeout_secs = Some(120);
        config.media.stretch_options = vec!["-c:a".to_string(), "pcm_s16le".to_string()];
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.media.process_timeout_secs, Some(120));
        assert_eq!(loaded.media.stretch_options, config.media.stretch_options);
        assert_eq!(loaded.stretch.fine_tolerance, 0.01);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retime.toml");
        std::fs::write(&path, "[stretch]\nmin_factor = 3.0\n").unwrap();

        assert!(matches!(Config::from_file(&path), Err(RetimeError::Config(_))));
    }
}
