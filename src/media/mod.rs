//! Media probing, sampling and segmentation via ffprobe/ffmpeg.

use std::path::{Path, PathBuf};

use crate::acquire::AcquiredAudio;
use crate::pipeline::{EventSink, PipelineEvent};
use crate::process::{run_capture, run_streaming};
use crate::{PipelineError, Result};

/// Segment file pattern. The 3-digit zero-padded sequence keeps filename
/// order equal to temporal order.
const SEGMENT_PATTERN: &str = "part_%03d.wav";

/// Stderr lines kept for the error report when splitting fails.
const STDERR_TAIL_LINES: usize = 20;

/// An ordered audio chunk belonging to one acquired waveform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub path: PathBuf,
}

impl Segment {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Duration of a media file in seconds, via ffprobe.
///
/// Advisory only: any failure (missing tool, non-zero exit, unparseable
/// output) yields 0.0 and must never gate a stage.
pub async fn duration_seconds(path: &Path) -> f64 {
    let path = path.to_string_lossy().into_owned();
    let out = run_capture(
        "ffprobe",
        &[
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            path.as_str(),
        ],
        None,
    )
    .await;

    if !out.success() {
        return 0.0;
    }
    out.stdout.trim().parse::<f64>().unwrap_or(0.0)
}

/// Stream-copy the leading `seconds` of `audio` into `dest`.
pub async fn extract_sample(audio: &AcquiredAudio, seconds: u32, dest: &Path) -> Result<()> {
    let input = audio.path.to_string_lossy().into_owned();
    let output = dest.to_string_lossy().into_owned();
    let secs = seconds.to_string();

    let out = run_capture(
        "ffmpeg",
        &[
            "-y",
            "-i",
            input.as_str(),
            "-t",
            secs.as_str(),
            "-c",
            "copy",
            output.as_str(),
        ],
        None,
    )
    .await;

    if !out.success() {
        anyhow::bail!("sample extraction failed: {}", out.stderr.trim());
    }
    Ok(())
}

/// Cut the waveform into fixed-length, sequentially numbered segments.
///
/// Runs ffmpeg in stream-copy mode so no re-encode happens; the final
/// segment may be shorter than `segment_seconds`. Fatal on a non-zero exit;
/// the acquired audio stays in place for the caller. `total_seconds` only
/// drives the progress percent.
pub async fn split(
    audio: &AcquiredAudio,
    segment_seconds: u32,
    dest_dir: &Path,
    total_seconds: f64,
    sink: &mut dyn EventSink,
) -> Result<Vec<Segment>> {
    let input = audio.path.to_string_lossy().into_owned();
    let pattern = dest_dir.join(SEGMENT_PATTERN).to_string_lossy().into_owned();
    let secs = segment_seconds.to_string();

    tracing::info!(segment_seconds, "splitting audio");
    let mut tail: Vec<String> = Vec::new();
    let code = run_streaming(
        "ffmpeg",
        &[
            "-y",
            "-i",
            input.as_str(),
            "-f",
            "segment",
            "-segment_time",
            secs.as_str(),
            "-c",
            "copy",
            pattern.as_str(),
        ],
        total_seconds,
        |line, percent| {
            if let Some(percent) = percent {
                sink.event(PipelineEvent::SplitProgress { percent });
            }
            sink.event(PipelineEvent::ToolOutput { line: line.to_string() });
            tail.push(line.to_string());
            if tail.len() > STDERR_TAIL_LINES {
                tail.remove(0);
            }
        },
    )
    .await;

    if code != 0 {
        return Err(PipelineError::Segmentation(format!(
            "ffmpeg exited with code {}: {}",
            code,
            tail.join("\n")
        ))
        .into());
    }

    collect_segments(dest_dir)
}

/// Every WAV in `dir` sorted by filename, which coincides with temporal
/// order thanks to the fixed-width numbering.
pub fn collect_segments(dir: &Path) -> Result<Vec<Segment>> {
    let mut paths: Vec<PathBuf> = fs_err::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| Segment { index, path })
        .collect())
}
