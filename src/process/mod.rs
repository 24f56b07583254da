//! Subprocess execution with captured or streamed output.

use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a command to completion, capturing both streams.
///
/// Never errors: a spawn failure (command not found etc.) is reported as exit
/// code 1 with the error message in stderr. No timeout is applied; media
/// operations are expected to run long.
pub async fn run_capture(program: &str, args: &[&str], cwd: Option<&Path>) -> CommandOutput {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    match cmd.output().await {
        Ok(out) => CommandOutput {
            exit_code: out.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        },
        Err(err) => CommandOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: err.to_string(),
        },
    }
}

/// Run a command, feeding each stderr line to `on_line` together with an
/// elapsed-percent estimate parsed from ffmpeg-style `time=` marks.
///
/// `total_seconds == 0.0` means the total is unknown and no percent is
/// computed. Follows the same no-raise policy as [`run_capture`]: spawn
/// failures surface as a line on the sink and exit code 1.
pub async fn run_streaming<F>(program: &str, args: &[&str], total_seconds: f64, mut on_line: F) -> i32
where
    F: FnMut(&str, Option<u8>),
{
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            on_line(&err.to_string(), None);
            return 1;
        }
    };

    if let Some(stderr) = child.stderr.take() {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let percent = parse_time_mark(&line).and_then(|elapsed| {
                if total_seconds > 0.0 {
                    Some(((elapsed / total_seconds) * 100.0).min(100.0) as u8)
                } else {
                    None
                }
            });
            on_line(line.trim_end(), percent);
        }
    }

    match child.wait().await {
        Ok(status) => status.code().unwrap_or(1),
        Err(err) => {
            on_line(&err.to_string(), None);
            1
        }
    }
}

/// Extract the elapsed seconds from an ffmpeg progress line such as
/// `size= 1024kB time=00:04:53.12 bitrate= 28.6kbits/s`.
pub fn parse_time_mark(line: &str) -> Option<f64> {
    let start = line.find("time=")? + "time=".len();
    let token = line[start..].split_whitespace().next()?;
    let mut parts = token.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
