//! vid2text - turn a video/audio URL into a downloadable transcript
//!
//! The pipeline shells out to yt-dlp to extract audio as WAV, probes the
//! duration with ffprobe, detects the spoken language from a short leading
//! sample, splits the waveform into fixed-length segments with ffmpeg and
//! transcribes each segment via a remote speech-recognition service with a
//! prioritized language-hint fallback chain. Individual segment failures are
//! recorded and survived; only acquisition and segmentation failures abort a
//! run.

pub mod acquire;
pub mod cli;
pub mod config;
pub mod language;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod transcribe;
pub mod utils;

pub use acquire::{AcquiredAudio, MediaSource};
pub use config::Config;
pub use pipeline::{RunResult, TranscriptionPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Fatal and precondition failures of the pipeline. Advisory failures
/// (language detection, single segments) never surface through this type.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("required tool is not installed: {0}")]
    MissingTool(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("audio acquisition failed: {0}")]
    Acquisition(String),

    #[error("audio segmentation failed: {0}")]
    Segmentation(String),
}
