use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vid2text",
    about = "Download a video's audio and turn it into a text transcript",
    version,
    long_about = "Downloads audio from any yt-dlp supported URL, detects the spoken \
language from a short sample, splits the audio into fixed-length segments and \
transcribes each one via a remote speech-recognition service. Failed segments \
are reported, not fatal."
)]
pub struct Cli {
    /// URL to transcribe (any site yt-dlp supports)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Cookie file passed to the downloader for authenticated sources
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Optional prefix for the output file names
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Directory for the final transcript and audio (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Sample window for language detection, in seconds (5-60)
    #[arg(long, value_name = "SECS")]
    pub sample_seconds: Option<u32>,

    /// Segment length for splitting, in seconds (60-1800)
    #[arg(long, value_name = "SECS")]
    pub segment_seconds: Option<u32>,

    /// Pause between segment transcriptions, in seconds (0-2)
    #[arg(long, value_name = "SECS")]
    pub pause_secs: Option<f64>,

    /// Base URL of the speech-recognition service
    #[arg(long, value_name = "URL", env = "VID2TEXT_RECOGNIZER_URL")]
    pub recognizer_url: Option<String>,

    /// Keep the per-run scratch directory instead of deleting it
    #[arg(long)]
    pub keep_temp: bool,

    /// Show subprocess output as it arrives
    #[arg(short, long)]
    pub verbose: bool,

    /// Delete the extracted audio once the transcript is written
    #[arg(long)]
    pub discard_audio: bool,
}
