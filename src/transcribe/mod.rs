//! The transcription loop and the speech-recognition capability seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

use crate::media::Segment;

pub mod http;

pub use http::HttpSpeechRecognizer;

/// Failure modes of the remote recognition capability.
#[derive(thiserror::Error, Debug)]
pub enum RecognizeError {
    #[error("no intelligible speech")]
    NoSpeech,

    #[error("recognition service error: {0}")]
    Service(String),
}

/// Capability seam for remote speech-to-text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe one audio file, optionally biased towards a language.
    async fn recognize<'a>(
        &self,
        audio: &Path,
        language: Option<&'a str>,
    ) -> Result<String, RecognizeError>;
}

/// Exactly one outcome is recorded per segment, in segment order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentOutcome {
    Recognized { segment: String, text: String },
    Failed { segment: String },
}

impl SegmentOutcome {
    pub fn segment(&self) -> &str {
        match self {
            SegmentOutcome::Recognized { segment, .. } => segment,
            SegmentOutcome::Failed { segment } => segment,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            SegmentOutcome::Recognized { text, .. } => Some(text),
            SegmentOutcome::Failed { .. } => None,
        }
    }
}

/// Try an ordered list of language hints, returning the first successful
/// transcription or the last error.
pub async fn first_success(
    recognizer: &dyn SpeechRecognizer,
    audio: &Path,
    hints: &[Option<&str>],
) -> Result<String, RecognizeError> {
    let mut last = RecognizeError::NoSpeech;
    for hint in hints {
        match recognizer.recognize(audio, *hint).await {
            Ok(text) => return Ok(text),
            Err(err) => last = err,
        }
    }
    Err(last)
}

/// Transcribe every segment in order with a prioritized hint chain: the
/// detected language first, then no hint, then `ar`, then `en`.
///
/// A segment whose whole chain fails is recorded and skipped; the loop never
/// aborts. `on_progress(processed, total)` fires exactly once per segment,
/// after it completes. The pause between segments is a courtesy towards the
/// remote service, not a correctness requirement.
pub async fn transcribe_all<F>(
    recognizer: &dyn SpeechRecognizer,
    segments: &[Segment],
    language: &str,
    pause: Duration,
    mut on_progress: F,
) -> Vec<SegmentOutcome>
where
    F: FnMut(usize, usize),
{
    let total = segments.len();
    let mut outcomes = Vec::with_capacity(total);

    for (done, segment) in segments.iter().enumerate() {
        let hints = [Some(language), None, Some("ar"), Some("en")];
        match first_success(recognizer, &segment.path, &hints).await {
            Ok(text) => {
                tracing::info!(segment = %segment.name(), chars = text.len(), "segment transcribed");
                outcomes.push(SegmentOutcome::Recognized {
                    segment: segment.name(),
                    text,
                });
            }
            Err(err) => {
                tracing::warn!(segment = %segment.name(), %err, "segment failed after all fallbacks");
                outcomes.push(SegmentOutcome::Failed {
                    segment: segment.name(),
                });
            }
        }

        on_progress(done + 1, total);
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn segment(index: usize) -> Segment {
        Segment {
            index,
            path: PathBuf::from(format!("part_{index:03}.wav")),
        }
    }

    #[tokio::test]
    async fn one_outcome_per_segment_in_order() {
        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize().returning(|audio, _| {
            let name = audio.file_name().unwrap().to_string_lossy().into_owned();
            Ok(format!("text for {name}"))
        });

        let segments: Vec<_> = (0..3).map(segment).collect();
        let outcomes =
            transcribe_all(&mock, &segments, "en", Duration::ZERO, |_, _| {}).await;

        assert_eq!(outcomes.len(), 3);
        for (seg, outcome) in segments.iter().zip(&outcomes) {
            assert_eq!(outcome.segment(), seg.name());
            assert!(outcome.text().is_some());
        }
    }

    #[tokio::test]
    async fn failed_segment_does_not_abort_the_loop() {
        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize().returning(|audio, _| {
            if audio.to_string_lossy().contains("part_001") {
                Err(RecognizeError::NoSpeech)
            } else {
                Ok("ok".to_string())
            }
        });

        let segments: Vec<_> = (0..3).map(segment).collect();
        let outcomes =
            transcribe_all(&mock, &segments, "en", Duration::ZERO, |_, _| {}).await;

        assert_eq!(
            outcomes,
            vec![
                SegmentOutcome::Recognized { segment: "part_000.wav".into(), text: "ok".into() },
                SegmentOutcome::Failed { segment: "part_001.wav".into() },
                SegmentOutcome::Recognized { segment: "part_002.wav".into(), text: "ok".into() },
            ]
        );
    }

    #[tokio::test]
    async fn progress_fires_once_per_segment_strictly_increasing() {
        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize().returning(|_, _| Ok("ok".to_string()));

        let segments: Vec<_> = (0..4).map(segment).collect();
        let mut calls = Vec::new();
        transcribe_all(&mock, &segments, "en", Duration::ZERO, |done, total| {
            calls.push((done, total));
        })
        .await;

        assert_eq!(calls, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[tokio::test]
    async fn fallback_chain_tries_hints_in_order() {
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);

        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize().returning(move |_, hint| {
            let mut seen = recorder.lock().unwrap();
            seen.push(hint.map(|h| h.to_string()));
            if seen.len() < 4 {
                Err(RecognizeError::Service("down".into()))
            } else {
                Ok("finally".to_string())
            }
        });

        let segments = vec![segment(0)];
        let outcomes =
            transcribe_all(&mock, &segments, "fr", Duration::ZERO, |_, _| {}).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("fr".into()), None, Some("ar".into()), Some("en".into())]
        );
        assert!(outcomes[0].text().is_some());
    }

    #[tokio::test]
    async fn first_success_returns_last_error_when_exhausted() {
        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize()
            .returning(|_, _| Err(RecognizeError::Service("unreachable".into())));

        let err = first_success(&mock, Path::new("a.wav"), &[Some("en"), None])
            .await
            .unwrap_err();
        assert!(matches!(err, RecognizeError::Service(_)));
    }
}
