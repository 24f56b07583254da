//! Structured run events. The pipeline holds no process-wide log state;
//! callers supply a sink and decide how to render progress.

use std::path::PathBuf;

/// One step of the sequential pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    DetectLanguage,
    Split,
    Transcribe,
    Assemble,
}

impl Stage {
    pub fn describe(&self) -> &'static str {
        match self {
            Stage::Acquire => "downloading and extracting audio",
            Stage::DetectLanguage => "detecting language from a short sample",
            Stage::Split => "splitting audio into segments",
            Stage::Transcribe => "transcribing segments",
            Stage::Assemble => "assembling transcript",
        }
    }
}

/// Events emitted while a run executes, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted { stage: Stage },
    AudioAcquired { path: PathBuf },
    LanguageDetected { code: String },
    /// Elapsed-fraction percent of the split, derived from ffmpeg time marks.
    SplitProgress { percent: u8 },
    SegmentsReady { count: usize },
    /// Fires once per segment, after it completes, with a strictly
    /// increasing processed count.
    SegmentProgress { processed: usize, total: usize },
    SegmentFailed { segment: String },
    /// Raw subprocess output line, for verbose passthrough.
    ToolOutput { line: String },
}

/// Caller-supplied receiver for pipeline events.
pub trait EventSink: Send {
    fn event(&mut self, event: PipelineEvent);
}

/// Sink that drops everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn event(&mut self, _event: PipelineEvent) {}
}

/// Sink that forwards events to tracing.
pub struct LogSink;

impl EventSink for LogSink {
    fn event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage } => tracing::info!("{}", stage.describe()),
            PipelineEvent::AudioAcquired { path } => {
                tracing::info!(path = %path.display(), "audio acquired")
            }
            PipelineEvent::LanguageDetected { code } => {
                tracing::info!(language = %code, "language selected")
            }
            PipelineEvent::SplitProgress { percent } => {
                tracing::debug!(percent, "splitting audio")
            }
            PipelineEvent::SegmentsReady { count } => tracing::info!(count, "segments ready"),
            PipelineEvent::SegmentProgress { processed, total } => {
                tracing::info!(processed, total, "segment done")
            }
            PipelineEvent::SegmentFailed { segment } => {
                tracing::warn!(%segment, "segment failed")
            }
            PipelineEvent::ToolOutput { line } => tracing::debug!("{line}"),
        }
    }
}
