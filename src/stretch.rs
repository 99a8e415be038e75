//! Stretch factor computation and atempo chain decomposition.
//!
//! ffmpeg's `atempo` filter only keeps good quality for rates in
//! [`STAGE_MIN`, `STAGE_MAX`], so larger corrections are expressed as a chain
//! of stages whose product is the overall factor.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::StretchConfig;
use crate::error::{Result, RetimeError};

/// Lowest rate a single atempo stage is given
pub const STAGE_MIN: f64 = 0.5;
/// Highest rate a single atempo stage is given
pub const STAGE_MAX: f64 = 2.0;

/// Ordered atempo stages; applying them in sequence multiplies their rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StretchPlan {
    stages: Vec<f64>,
}

impl StretchPlan {
    /// Greedily peel whole 2.0 or 0.5 stages off `factor` until the
    /// remainder fits in a single stage, which is appended last. Factors that
    /// are not finite and positive come back as a single untouched stage.
    pub fn decompose(factor: f64) -> Self {
        if !(factor.is_finite() && factor > 0.0) {
            return Self { stages: vec![factor] };
        }

        let mut stages = Vec::new();
        let mut remaining = factor;

        while remaining > STAGE_MAX || remaining < STAGE_MIN {
            let stage = if remaining > STAGE_MAX { STAGE_MAX } else { STAGE_MIN };
            stages.push(stage);
            remaining /= stage;
            debug_assert!(((stages.iter().product::<f64>() * remaining) / factor - 1.0).abs() < 1e-9);
        }
        stages.push(remaining);

        Self { stages }
    }

    pub fn stages(&self) -> &[f64] {
        &self.stages
    }

    pub fn product(&self) -> f64 {
        self.stages.iter().product()
    }

    /// Render the chain as one ffmpeg audio filter description
    pub fn filter_chain(&self) -> String {
        self.stages
            .iter()
            .map(|stage| format!("atempo={}", stage))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// What the reconciler decided for a pair of durations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StretchDecision {
    pub current_duration: f64,
    pub target_duration: f64,
    pub raw_factor: f64,
    pub clamped_factor: f64,
    /// `None` when the correction is within the fine tolerance
    pub plan: Option<StretchPlan>,
}

impl StretchDecision {
    pub fn compute(current_duration: f64, target_duration: f64, config: &StretchConfig) -> Result<Self> {
        if !(target_duration.is_finite() && target_duration > 0.0) {
            return Err(RetimeError::UnparseableSubtitle(format!(
                "subtitle track spans {:.3}s; a positive duration is required",
                target_duration
            )));
        }
        if !(current_duration.is_finite() && current_duration > 0.0) {
            return Err(RetimeError::Probe(format!(
                "audio duration must be positive, got {:.3}s",
                current_duration
            )));
        }

        let raw_factor = current_duration / target_duration;
        let clamped_factor = clamp_factor(raw_factor, config);

        let plan = if needs_stretch(clamped_factor, config.fine_tolerance) {
            Some(StretchPlan::decompose(clamped_factor))
        } else {
            None
        };

        Ok(Self {
            current_duration,
            target_duration,
            raw_factor,
            clamped_factor,
            plan,
        })
    }
}

/// Limit the overall factor to the configured bounds
pub fn clamp_factor(raw: f64, config: &StretchConfig) -> f64 {
    if raw > config.max_factor {
        warn!("Limiting stretch factor from {:.4} to {}", raw, config.max_factor);
        config.max_factor
    } else if raw < config.min_factor {
        warn!("Limiting stretch factor from {:.4} to {}", raw, config.min_factor);
        config.min_factor
    } else {
        debug!("Stretch factor {:.4} is within bounds", raw);
        raw
    }
}

pub fn needs_stretch(factor: f64, fine_tolerance: f64) -> bool {
    (factor - 1.0).abs() >= fine_tolerance
}
