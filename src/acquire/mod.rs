//! Audio acquisition: drives yt-dlp to fetch and transcode a URL's audio
//! into a single WAV file owned by the current run.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::process::run_capture;
use crate::utils::sanitize_filename;
use crate::{PipelineError, Result};

/// Output filename template handed to yt-dlp: title capped at 100 characters
/// plus the media id.
const OUTPUT_TEMPLATE: &str = "%(title).100s-%(id)s.%(ext)s";

/// Identifies the input of a run. Immutable once accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSource {
    /// Any URL yt-dlp supports.
    pub url: String,

    /// Cookie file injected into the downloader for authenticated sources.
    pub cookies: Option<PathBuf>,

    /// Optional prefix for the final artifact names.
    pub prefix: Option<String>,
}

impl MediaSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cookies: None,
            prefix: None,
        }
    }

    /// Reject empty or non-http(s) input before any run state is created.
    pub fn validate(&self) -> Result<()> {
        let trimmed = self.url.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidInput("no URL provided".into()).into());
        }

        let parsed = url::Url::parse(trimmed)
            .map_err(|_| PipelineError::InvalidInput(format!("not a valid URL: {trimmed}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PipelineError::InvalidInput("URL must use http or https".into()).into());
        }

        Ok(())
    }
}

/// A single waveform file on durable storage, created by acquisition and
/// consumed by the sampler and the segmenter.
#[derive(Debug, Clone)]
pub struct AcquiredAudio {
    pub path: PathBuf,
    pub base_name: String,
}

/// Download and transcode the source's audio into `download_dir`, then
/// relocate the resulting WAV to `output_dir` under its sanitized base name.
///
/// Fatal when yt-dlp exits non-zero or leaves no WAV behind; the captured
/// stderr travels with the error for diagnostics.
pub async fn acquire(
    source: &MediaSource,
    download_dir: &Path,
    output_dir: &Path,
) -> Result<AcquiredAudio> {
    let mut args: Vec<&str> = vec![
        "--extract-audio",
        "--audio-format",
        "wav",
        "--no-playlist",
        "-o",
        OUTPUT_TEMPLATE,
        "--no-warnings",
        "--embed-metadata",
    ];

    let cookie_path;
    if let Some(cookies) = &source.cookies {
        cookie_path = cookies.to_string_lossy().into_owned();
        args.push("--cookies");
        args.push(cookie_path.as_str());
        tracing::info!(cookies = %cookies.display(), "using cookie file");
    }
    args.push(source.url.trim());

    // The template is relative; yt-dlp writes into the download directory.
    tracing::info!(url = %source.url.trim(), "downloading audio with yt-dlp");
    let out = run_capture("yt-dlp", &args, Some(download_dir)).await;
    if !out.success() {
        return Err(PipelineError::Acquisition(format!(
            "yt-dlp exited with code {}: {}",
            out.exit_code,
            out.stderr.trim()
        ))
        .into());
    }

    let mut wavs = wav_files(download_dir)?;
    let src = match wavs.len() {
        0 => {
            return Err(
                PipelineError::Acquisition("no WAV file found after download".into()).into(),
            )
        }
        1 => wavs.remove(0),
        n => {
            // A single non-playlist download should produce one file; if it
            // somehow does not, keep the first by name order.
            tracing::warn!(count = n, "multiple WAV files after download; keeping the first");
            wavs.remove(0)
        }
    };

    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base_name = artifact_base_name(&stem, source.prefix.as_deref());

    let dest = output_dir.join(format!("{base_name}.wav"));
    relocate(&src, &dest)?;
    tracing::info!(path = %dest.display(), "acquired audio");

    Ok(AcquiredAudio { path: dest, base_name })
}

/// Sanitized base for the final artifacts, optionally preceded by the
/// sanitized prefix.
fn artifact_base_name(stem: &str, prefix: Option<&str>) -> String {
    let base = sanitize_filename(stem);
    match prefix.map(sanitize_filename).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}_{base}"),
        None => base,
    }
}

/// WAV files in `dir`, sorted by filename.
fn wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs_err::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Move a file, falling back to copy-and-delete across filesystems. The
/// source no longer exists afterwards.
fn relocate(src: &Path, dest: &Path) -> Result<()> {
    if fs_err::rename(src, dest).is_err() {
        fs_err::copy(src, dest)
            .with_context(|| format!("copying {} to {}", src.display(), dest.display()))?;
        fs_err::remove_file(src)?;
    }
    Ok(())
}
