// Media processing seam for the reconciler
//
// - Processor: ffmpeg/ffprobe implementation
// - Commands: command builders and process execution

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;
use crate::stretch::StretchPlan;

/// Operations the reconciler needs from an external media tool
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Container duration in seconds
    async fn probe_duration(&self, audio_path: &Path) -> Result<f64>;

    /// Re-time `input_path` through every stage of `plan` in one run
    async fn time_stretch(
        &self,
        input_path: &Path,
        plan: &StretchPlan,
        output_path: &Path,
    ) -> Result<()>;

    /// Check that the media tools can be executed
    async fn check_availability(&self) -> Result<()>;

    /// First line of `-version` output for each tool
    async fn get_version_info(&self) -> Result<Vec<String>>;
}

/// Factory for creating media backend instances
pub struct MediaBackendFactory;

impl MediaBackendFactory {
    /// Create the default media backend implementation (FFmpeg-based)
    pub fn create_backend(config: MediaConfig) -> Box<dyn MediaBackend> {
        Box::new(processor::FfmpegBackend::new(config))
    }
}
