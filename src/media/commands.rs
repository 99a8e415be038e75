use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, RetimeError};
use crate::stretch::StretchPlan;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    pub timeout: Option<Duration>,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            timeout: None,
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Add audio filter graph
    pub fn audio_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-filter:a").arg(filter)
    }

    /// Kill the process if it has not finished within `timeout`
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run to completion and return the raw output
    async fn run(&self) -> Result<Output> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args).kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| RetimeError::Timeout(self.description.clone(), limit.as_secs()))?,
            None => cmd.output().await,
        };

        output.map_err(|e| {
            RetimeError::Stretch(format!("Failed to execute {}: {}", self.binary_path, e))
        })
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        let output = self.run().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RetimeError::Stretch(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Execute the command and return its trimmed stdout
    pub async fn execute_capture(&self) -> Result<String> {
        let output = self.run().await.map_err(|e| match e {
            RetimeError::Stretch(msg) => RetimeError::Probe(msg),
            other => other,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RetimeError::Probe(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Builder for the ffmpeg/ffprobe invocations the reconciler needs
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Option<Duration>,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build container duration probe command
    pub fn probe_duration<P: AsRef<Path>>(&self, audio_path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Duration probe")
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .output(audio_path)
            .timeout(self.timeout)
    }

    /// Build a single ffmpeg run applying the whole atempo chain
    pub fn time_stretch<P: AsRef<Path>>(
        &self,
        input_path: P,
        plan: &StretchPlan,
        output_path: P,
        additional_options: &[String],
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.ffmpeg_path, "Time stretch")
            .overwrite()
            .input(input_path)
            .audio_filter(plan.filter_chain());

        // Add user-specified additional options
        for option in additional_options {
            cmd = cmd.arg(option);
        }

        cmd.output(output_path).timeout(self.timeout)
    }

    /// Build version check command for ffmpeg or ffprobe
    pub fn version_check(&self, tool: MediaTool) -> MediaCommand {
        let binary = match tool {
            MediaTool::Ffmpeg => &self.ffmpeg_path,
            MediaTool::Ffprobe => &self.ffprobe_path,
        };
        MediaCommand::new(binary, "Version check")
            .arg("-version")
            .timeout(self.timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTool {
    Ffmpeg,
    Ffprobe,
}
