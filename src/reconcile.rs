use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

use crate::config::{Config, StretchConfig};
use crate::error::{Result, RetimeError};
use crate::media::{MediaBackend, MediaBackendFactory};
use crate::stretch::StretchDecision;
use crate::subtitle::SubtitleTrack;

/// Fits a generated audio track to the span of its subtitle track
pub struct DurationReconciler {
    config: StretchConfig,
    media: Box<dyn MediaBackend>,
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub audio_path: PathBuf,
    pub subtitle_path: PathBuf,
    /// Where the audio was actually written
    pub output_path: PathBuf,
    pub decision: StretchDecision,
}

impl ReconcileReport {
    pub fn was_stretched(&self) -> bool {
        self.decision.plan.is_some()
    }
}

#[derive(Debug)]
pub enum ReconcileOutcome {
    Success(ReconcileReport),
    Failure(RetimeError),
}

impl ReconcileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReconcileOutcome::Success(_))
    }

    pub fn output_path(&self) -> Option<&Path> {
        match self {
            ReconcileOutcome::Success(report) => Some(&report.output_path),
            ReconcileOutcome::Failure(_) => None,
        }
    }
}

impl DurationReconciler {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let media = MediaBackendFactory::create_backend(config.media.clone());
        Ok(Self::with_backend(config.stretch, media))
    }

    pub fn with_backend(config: StretchConfig, media: Box<dyn MediaBackend>) -> Self {
        Self { config, media }
    }

    pub fn media(&self) -> &dyn MediaBackend {
        self.media.as_ref()
    }

    /// Reconcile and report a boolean-style outcome; never returns an error.
    pub async fn reconcile<P: AsRef<Path>>(
        &self,
        audio_path: P,
        subtitle_path: P,
        output_path: P,
    ) -> ReconcileOutcome {
        match self.try_reconcile(audio_path, subtitle_path, output_path).await {
            Ok(report) => ReconcileOutcome::Success(report),
            Err(e) => {
                error!("An error occurred during audio adjustment: {}", e);
                ReconcileOutcome::Failure(e)
            }
        }
    }

    /// Measure both inputs and decide how to stretch, without writing anything
    pub async fn plan<P: AsRef<Path>>(
        &self,
        audio_path: P,
        subtitle_path: P,
    ) -> Result<StretchDecision> {
        let audio_path = audio_path.as_ref();
        let subtitle_path = subtitle_path.as_ref();

        if !audio_path.exists() {
            return Err(RetimeError::MissingInput(audio_path.display().to_string()));
        }
        if !subtitle_path.exists() {
            return Err(RetimeError::MissingInput(subtitle_path.display().to_string()));
        }

        let track = SubtitleTrack::load(subtitle_path).await?;
        let target_duration = track.target_duration();
        let current_duration = self.media.probe_duration(audio_path).await?;

        info!(
            "Current audio duration: {:.2}s, Target SRT duration: {:.2}s",
            current_duration, target_duration
        );

        let decision = StretchDecision::compute(current_duration, target_duration, &self.config)?;
        info!("Calculated stretch factor: {:.4}", decision.raw_factor);

        Ok(decision)
    }

    /// Reconcile, propagating the first failure
    pub async fn try_reconcile<P: AsRef<Path>>(
        &self,
        audio_path: P,
        subtitle_path: P,
        output_path: P,
    ) -> Result<ReconcileReport> {
        let audio_path = audio_path.as_ref();
        let subtitle_path = subtitle_path.as_ref();
        info!("Adjusting {} to match {}", audio_path.display(), subtitle_path.display());

        let decision = self.plan(audio_path, subtitle_path).await?;

        let created_dirs = create_output_dir(output_path.as_ref()).await?;
        let output_path = unique_output_path(output_path.as_ref());

        let written = match &decision.plan {
            None => {
                info!("Adjustment is minimal; original audio retained to preserve quality");
                fs::copy(audio_path, &output_path).await.map(|_| ()).map_err(RetimeError::from)
            }
            Some(plan) => self.media.time_stretch(audio_path, plan, &output_path).await,
        };
        if let Err(e) = written {
            discard_partial_output(&output_path, &created_dirs).await;
            return Err(e);
        }

        info!("Audio saved to {}", output_path.display());
        Ok(ReconcileReport {
            audio_path: audio_path.to_path_buf(),
            subtitle_path: subtitle_path.to_path_buf(),
            output_path,
            decision,
        })
    }
}

/// Create the parent directory of `output_path`, returning the directories
/// this call created, deepest first.
async fn create_output_dir(output_path: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    let Some(parent) = output_path.parent() else {
        return Ok(created);
    };

    let mut dir = Some(parent);
    while let Some(d) = dir {
        if d.as_os_str().is_empty() || d.exists() {
            break;
        }
        created.push(d.to_path_buf());
        dir = d.parent();
    }

    if !created.is_empty() {
        fs::create_dir_all(parent).await?;
    }
    Ok(created)
}

async fn discard_partial_output(path: &Path, created_dirs: &[PathBuf]) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path).await {
            warn!("Failed to remove partial output {}: {}", path.display(), e);
        }
    }
    for dir in created_dirs {
        // Stops at the first directory something else has written into
        if fs::remove_dir(dir).await.is_err() {
            break;
        }
    }
}

/// Return `nominal` if nothing is there yet, otherwise a sibling path with a
/// `_YYYYMMDD_HHMMSS` token inserted before the extension.
pub fn unique_output_path(nominal: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    unique_output_path_with_stamp(nominal, &stamp)
}

fn unique_output_path_with_stamp(nominal: &Path, stamp: &str) -> PathBuf {
    if !nominal.exists() {
        return nominal.to_path_buf();
    }

    let candidate = timestamped_path(nominal, stamp);
    if !candidate.exists() {
        return candidate;
    }

    // Same second as an earlier run
    (1u32..)
        .map(|n| timestamped_path(nominal, &format!("{}_{}", stamp, n)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn timestamped_path(nominal: &Path, stamp: &str) -> PathBuf {
    let stem = nominal
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let file_name = match nominal.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    };
    nominal.with_file_name(file_name)
}
