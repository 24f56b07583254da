//! The sequential segmentation-and-transcription pipeline.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mod events;

pub use events::{EventSink, LogSink, NullSink, PipelineEvent, Stage};

use crate::acquire::{self, AcquiredAudio, MediaSource};
use crate::config::Config;
use crate::language::{self, LanguageIdentifier, ScriptIdentifier};
use crate::media;
use crate::output;
use crate::transcribe::{self, HttpSpeechRecognizer, SegmentOutcome, SpeechRecognizer};
use crate::{utils, PipelineError, Result};

/// Final artifact set of a completed run. Built once after aggregation;
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub transcript_path: PathBuf,
    pub audio_path: Option<PathBuf>,
    pub language: String,
    pub total_segments: usize,
    pub processed_segments: usize,
    pub failed_segments: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Runs the stages strictly in sequence: acquire, sample, split, transcribe,
/// assemble. All intermediate files live in a per-run scratch directory that
/// the pipeline owns exclusively.
pub struct TranscriptionPipeline {
    config: Config,
    recognizer: Arc<dyn SpeechRecognizer>,
    identifier: Box<dyn LanguageIdentifier>,
}

impl TranscriptionPipeline {
    pub fn new(config: Config) -> Result<Self> {
        let recognizer = HttpSpeechRecognizer::new(
            config.recognizer_url.clone(),
            config.recognizer_timeout_secs,
        )?;
        Ok(Self::with_capabilities(
            config,
            Arc::new(recognizer),
            Box::new(ScriptIdentifier::new()),
        ))
    }

    /// Inject alternate capability implementations.
    pub fn with_capabilities(
        config: Config,
        recognizer: Arc<dyn SpeechRecognizer>,
        identifier: Box<dyn LanguageIdentifier>,
    ) -> Self {
        Self {
            config,
            recognizer,
            identifier,
        }
    }

    /// Run the whole pipeline for one source.
    ///
    /// Acquisition and segmentation failures abort the run; language
    /// detection and individual segment failures are absorbed. No error is
    /// raised once artifact writing has finished.
    pub async fn run(&self, source: &MediaSource, sink: &mut dyn EventSink) -> Result<RunResult> {
        source.validate()?;
        self.preflight().await?;

        let output_dir = match &self.config.output_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        fs_err::create_dir_all(&output_dir)?;

        let scratch = tempfile::Builder::new()
            .prefix("vid2text_")
            .tempdir()
            .context("creating scratch directory")?;
        let download_dir = scratch.path().join("download");
        let split_dir = scratch.path().join("split");
        fs_err::create_dir_all(&download_dir)?;
        fs_err::create_dir_all(&split_dir)?;

        sink.event(PipelineEvent::StageStarted { stage: Stage::Acquire });
        let audio = acquire::acquire(source, &download_dir, &output_dir).await?;
        sink.event(PipelineEvent::AudioAcquired { path: audio.path.clone() });

        // Advisory; only drives the split progress percent.
        let total_seconds = media::duration_seconds(&audio.path).await;
        if total_seconds > 0.0 {
            tracing::info!(duration = %utils::format_duration(total_seconds), "probed audio duration");
        }

        sink.event(PipelineEvent::StageStarted { stage: Stage::DetectLanguage });
        let language = self.detect_language(&audio, scratch.path()).await;
        sink.event(PipelineEvent::LanguageDetected { code: language.clone() });

        sink.event(PipelineEvent::StageStarted { stage: Stage::Split });
        let segments = media::split(
            &audio,
            self.config.segment_seconds,
            &split_dir,
            total_seconds,
            sink,
        )
        .await?;
        sink.event(PipelineEvent::SegmentsReady { count: segments.len() });

        sink.event(PipelineEvent::StageStarted { stage: Stage::Transcribe });
        let pause = Duration::from_secs_f64(self.config.segment_pause_secs);
        let outcomes = transcribe::transcribe_all(
            self.recognizer.as_ref(),
            &segments,
            &language,
            pause,
            |processed, total| {
                sink.event(PipelineEvent::SegmentProgress { processed, total });
            },
        )
        .await;
        for outcome in &outcomes {
            if let SegmentOutcome::Failed { segment } = outcome {
                sink.event(PipelineEvent::SegmentFailed { segment: segment.clone() });
            }
        }

        sink.event(PipelineEvent::StageStarted { stage: Stage::Assemble });
        let (body, failed_segments) = output::assemble(&outcomes);
        let transcript_path =
            output::write_transcript(&body, &output_dir.join(format!("{}.txt", audio.base_name)))?;
        tracing::info!(path = %transcript_path.display(), "transcript written");

        // Everything past this point is best effort; partial success is
        // already on disk.
        let audio_path = if self.config.keep_audio {
            Some(audio.path.clone())
        } else {
            let _ = fs_err::remove_file(&audio.path);
            None
        };

        if !self.config.cleanup_temp {
            let kept = scratch.into_path();
            tracing::info!(path = %kept.display(), "scratch directory retained");
        }

        Ok(RunResult {
            transcript_path,
            audio_path,
            language,
            total_segments: segments.len(),
            processed_segments: outcomes.len(),
            failed_segments,
            completed_at: Utc::now(),
        })
    }

    /// Required tools must exist before any run state is created.
    async fn preflight(&self) -> Result<()> {
        for (tool, flag) in [("yt-dlp", "--version"), ("ffmpeg", "-version")] {
            if !utils::check_command_available(tool, flag).await {
                return Err(PipelineError::MissingTool(tool.to_string()).into());
            }
        }
        if !utils::check_command_available("ffprobe", "-version").await {
            tracing::warn!("ffprobe not found; duration-based progress disabled");
        }
        Ok(())
    }

    /// Extract the leading sample and classify it. Never fails; every error
    /// path resolves to the default language code.
    async fn detect_language(&self, audio: &AcquiredAudio, scratch: &Path) -> String {
        let sample_path = scratch.join("sample.wav");
        match media::extract_sample(audio, self.config.sample_seconds, &sample_path).await {
            Ok(()) => {
                language::sample_language(
                    self.recognizer.as_ref(),
                    self.identifier.as_ref(),
                    &sample_path,
                )
                .await
            }
            Err(err) => {
                tracing::warn!(%err, "sample extraction failed; falling back to {}", language::DEFAULT_LANGUAGE);
                language::DEFAULT_LANGUAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::MockSpeechRecognizer;

    fn pipeline() -> TranscriptionPipeline {
        TranscriptionPipeline::with_capabilities(
            Config::default(),
            Arc::new(MockSpeechRecognizer::new()),
            Box::new(ScriptIdentifier::new()),
        )
    }

    #[tokio::test]
    async fn empty_url_is_rejected_before_anything_runs() {
        let pipeline = pipeline();
        let err = pipeline
            .run(&MediaSource::new(""), &mut NullSink)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref(),
            Some(PipelineError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn non_http_url_is_rejected() {
        let pipeline = pipeline();
        let err = pipeline
            .run(&MediaSource::new("file:///etc/passwd"), &mut NullSink)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref(),
            Some(PipelineError::InvalidInput(_))
        ));
    }

    #[cfg(unix)]
    fn stub_tool(dir: &Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs_err::write(&path, body).unwrap();
        fs_err::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_download_aborts_before_any_artifact_exists() {
        // A downloader that passes the preflight version check but fails
        // every actual download.
        let bin = tempfile::tempdir().unwrap();
        stub_tool(
            bin.path(),
            "yt-dlp",
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then exit 0; fi\n\
             echo 'ERROR: unable to download' >&2\n\
             exit 1\n",
        );
        stub_tool(bin.path(), "ffmpeg", "#!/bin/sh\nexit 0\n");

        let old_path = std::env::var("PATH").unwrap_or_default();
        std::env::set_var("PATH", format!("{}:{old_path}", bin.path().display()));

        let output = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: Some(output.path().to_path_buf()),
            ..Config::default()
        };
        let pipeline = TranscriptionPipeline::with_capabilities(
            config,
            Arc::new(MockSpeechRecognizer::new()),
            Box::new(ScriptIdentifier::new()),
        );

        let result = pipeline
            .run(&MediaSource::new("https://example.com/clip"), &mut NullSink)
            .await;
        std::env::set_var("PATH", old_path);

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref(),
            Some(PipelineError::Acquisition(_))
        ));
        // Nothing was split or written; the output directory stays empty.
        assert!(fs_err::read_dir(output.path()).unwrap().next().is_none());
    }
}
