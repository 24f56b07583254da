//! Aggregation of per-segment outcomes into the final text artifact.

use std::path::{Path, PathBuf};

use crate::transcribe::SegmentOutcome;
use crate::Result;

/// Concatenate successful outcomes in segment order, each paragraph followed
/// by a blank line, and collect failed segment names in the same order.
///
/// Never fails: an all-failed run yields an empty body and a full failure
/// list. Pure, so re-running over the same outcomes is byte-identical.
pub fn assemble(outcomes: &[SegmentOutcome]) -> (String, Vec<String>) {
    let mut body = String::new();
    let mut failed = Vec::new();

    for outcome in outcomes {
        match outcome {
            SegmentOutcome::Recognized { text, .. } => {
                body.push_str(text);
                body.push_str("\n\n");
            }
            SegmentOutcome::Failed { segment } => failed.push(segment.clone()),
        }
    }

    (body, failed)
}

/// Write the aggregated transcript as UTF-8.
pub fn write_transcript(body: &str, path: &Path) -> Result<PathBuf> {
    fs_err::write(path, body)?;
    Ok(path.to_path_buf())
}
