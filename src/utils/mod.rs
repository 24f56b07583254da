use tokio::process::Command;

/// Sanitize a media title for filesystem use. Word characters, dots, dashes
/// and spaces survive, everything else becomes an underscore; the result is
/// trimmed and remaining spaces turn into underscores. Stable under
/// re-application.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            c if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == ' ' => c,
            _ => '_',
        })
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Check that the external tools the pipeline shells out to are present,
/// returning a description of each missing one. ffprobe is intentionally not
/// listed here: without it duration probing degrades to 0.0 instead of
/// blocking the run.
pub async fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available("yt-dlp", "--version").await {
        missing.push("yt-dlp - required to download and extract audio".to_string());
    }

    if !check_command_available("ffmpeg", "-version").await {
        missing.push("ffmpeg - required to sample and split audio".to_string());
    }

    missing
}

/// Check if a command is available in PATH
pub async fn check_command_available(command: &str, version_flag: &str) -> bool {
    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Video! (2020).mp4"), "My_Video___2020_.mp4");
        assert_eq!(sanitize_filename("  spaced out  "), "spaced_out");
        assert_eq!(sanitize_filename("clip/with:odd*chars"), "clip_with_odd_chars");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["My Video! (2020).mp4", "a b\tc", "  x  ", "plain-name.wav"] {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn sanitize_output_stays_in_safe_charset() {
        let out = sanitize_filename("Ünïcode & «quotes» — video?.mp4");
        assert!(out
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.'));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }
}
