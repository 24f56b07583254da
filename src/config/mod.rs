use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::Cli;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Leading window used for language detection, in seconds (5-60).
    pub sample_seconds: u32,

    /// Fixed segment length for splitting, in seconds (60-1800).
    pub segment_seconds: u32,

    /// Remove the per-run scratch directory when the run ends.
    pub cleanup_temp: bool,

    /// Forward subprocess output lines to the console.
    pub verbose_tools: bool,

    /// Pause between segment transcriptions, in seconds (0-2).
    pub segment_pause_secs: f64,

    /// Keep the acquired WAV next to the transcript.
    pub keep_audio: bool,

    /// Base URL of the speech-recognition service.
    pub recognizer_url: String,

    /// HTTP timeout for recognition requests, in seconds.
    pub recognizer_timeout_secs: u64,

    /// Directory for final artifacts; current directory when unset.
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_seconds: 20,
            segment_seconds: 300,
            cleanup_temp: true,
            verbose_tools: false,
            segment_pause_secs: 0.1,
            keep_audio: true,
            recognizer_url: "http://127.0.0.1:9000".to_string(),
            recognizer_timeout_secs: 300,
            output_dir: None,
        }
    }
}

impl Config {
    /// Load from `config.yaml` in the working directory, then the user config
    /// directory, falling back to defaults. Out-of-range values are clamped
    /// rather than rejected.
    pub fn load() -> crate::Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = fs_err::read_to_string(&path).context("reading config file")?;
                serde_yaml::from_str(&content).context("parsing config file")?
            }
            _ => Self::default(),
        };
        config.clamp();
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        let local = PathBuf::from("config.yaml");
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir().map(|dir| dir.join("vid2text").join("config.yaml"))
    }

    /// Bring every bounded option back into its documented range.
    pub fn clamp(&mut self) {
        self.sample_seconds = self.sample_seconds.clamp(5, 60);
        self.segment_seconds = self.segment_seconds.clamp(60, 1800);
        self.segment_pause_secs = self.segment_pause_secs.clamp(0.0, 2.0);
    }

    /// Fold CLI overrides into the loaded configuration.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = cli.sample_seconds {
            self.sample_seconds = v;
        }
        if let Some(v) = cli.segment_seconds {
            self.segment_seconds = v;
        }
        if let Some(v) = cli.pause_secs {
            self.segment_pause_secs = v;
        }
        if let Some(url) = &cli.recognizer_url {
            self.recognizer_url = url.clone();
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = Some(dir.clone());
        }
        if cli.keep_temp {
            self.cleanup_temp = false;
        }
        if cli.verbose {
            self.verbose_tools = true;
        }
        if cli.discard_audio {
            self.keep_audio = false;
        }
        self.clamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_brings_values_into_range() {
        let mut config = Config {
            sample_seconds: 2,
            segment_seconds: 10_000,
            segment_pause_secs: 9.0,
            ..Config::default()
        };
        config.clamp();
        assert_eq!(config.sample_seconds, 5);
        assert_eq!(config.segment_seconds, 1800);
        assert_eq!(config.segment_pause_secs, 2.0);
    }

    #[test]
    fn partial_yaml_uses_defaults_for_the_rest() {
        let config: Config = serde_yaml::from_str("segment_seconds: 120\n").unwrap();
        assert_eq!(config.segment_seconds, 120);
        assert_eq!(config.sample_seconds, 20);
        assert!(config.cleanup_temp);
    }

    #[test]
    fn yaml_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.segment_seconds, config.segment_seconds);
        assert_eq!(parsed.recognizer_url, config.recognizer_url);
    }
}
