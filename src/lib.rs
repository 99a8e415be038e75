//! Retime - Subtitle-driven audio duration reconciliation
//!
//! Fits a dubbed (TTS-generated) audio track to the span of its subtitle
//! track by probing the audio with ffprobe and re-timing it with a chained
//! ffmpeg `atempo` filter.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod reconcile;
pub mod stretch;
pub mod subtitle;
