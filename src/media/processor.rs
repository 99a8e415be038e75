use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, RetimeError};
use crate::stretch::StretchPlan;
use super::{MediaBackend, MediaCommandBuilder, MediaTool};

/// Concrete implementation of the media backend (FFmpeg-based)
pub struct FfmpegBackend {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegBackend {
    /// Create a new ffmpeg backend
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path)
            .with_timeout(config.process_timeout_secs.map(Duration::from_secs));

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe_duration(&self, audio_path: &Path) -> Result<f64> {
        debug!("Probing duration of {}", audio_path.display());

        let stdout = self.command_builder.probe_duration(audio_path).execute_capture().await?;
        let duration = parse_probe_output(&stdout)?;

        debug!("{} lasts {:.3}s", audio_path.display(), duration);
        Ok(duration)
    }

    async fn time_stretch(
        &self,
        input_path: &Path,
        plan: &StretchPlan,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Applying ffmpeg filter {} to {} -> {}",
            plan.filter_chain(),
            input_path.display(),
            output_path.display()
        );

        let command = self.command_builder.time_stretch(
            input_path,
            plan,
            output_path,
            &self.config.stretch_options,
        );
        command.execute().await?;

        if !output_path.exists() {
            return Err(RetimeError::Stretch(format!(
                "ffmpeg reported success but {} was not written",
                output_path.display()
            )));
        }

        info!("Time stretch completed");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        for tool in [MediaTool::Ffmpeg, MediaTool::Ffprobe] {
            self.command_builder
                .version_check(tool)
                .execute_capture()
                .await
                .map_err(|e| RetimeError::Config(format!("{:?} is not available: {}", tool, e)))?;
        }
        info!("ffmpeg and ffprobe are available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<Vec<String>> {
        debug!("Getting media tool version information");

        let mut versions = Vec::new();
        for tool in [MediaTool::Ffmpeg, MediaTool::Ffprobe] {
            let stdout = self.command_builder.version_check(tool).execute_capture().await?;
            // The first line carries the version
            let first_line = stdout.lines().next().unwrap_or("Unknown version");
            versions.push(first_line.to_string());
        }
        Ok(versions)
    }
}

/// Parse ffprobe's `format=duration` output
pub fn parse_probe_output(stdout: &str) -> Result<f64> {
    let value = stdout.trim();
    let duration: f64 = value.parse().map_err(|_| {
        RetimeError::Probe(format!("ffprobe returned a non-numeric duration: {:?}", value))
    })?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(RetimeError::Probe(format!("ffprobe returned an unusable duration: {}", value)));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        assert_eq!(parse_probe_output("12.345000\n").unwrap(), 12.345);
        assert_eq!(parse_probe_output("  3 ").unwrap(), 3.0);
        assert!(matches!(parse_probe_output("N/A"), Err(RetimeError::Probe(_))));
        assert!(matches!(parse_probe_output(""), Err(RetimeError::Probe(_))));
        assert!(matches!(parse_probe_output("0.000000"), Err(RetimeError::Probe(_))));
        assert!(matches!(parse_probe_output("-1"), Err(RetimeError::Probe(_))));
    }

    #[tokio::test]
    async fn test_unavailable_tools() {
        let config = MediaConfig {
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            ..MediaConfig::default()
        };
        let backend = FfmpegBackend::new(config);

        assert!(backend.check_availability().await.is_err());
        let result = backend.probe_duration(Path::new("whatever.wav")).await;
        assert!(matches!(result, Err(RetimeError::Probe(_))));
    }
}
