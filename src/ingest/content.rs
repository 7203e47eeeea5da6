//! Per-file content reads with placeholder substitution.

use super::policy::IngestReport;
use super::source::FileHandle;
use crate::tree::limits::ContentPolicy;
use tracing::warn;

/// Read a file's text, never failing.
///
/// Oversize files are not read at all. Invalid UTF-8 is decoded lossily.
pub async fn read_content(
    file: &dyn FileHandle,
    policy: &ContentPolicy,
    report: &mut IngestReport,
) -> String {
    let name = file.name();
    let size = match file.size().await {
        Ok(size) => size,
        Err(e) => {
            warn!(file = name, error = %e, "Failed to stat file");
            report.read_failures += 1;
            return ContentPolicy::read_failure_placeholder(name);
        }
    };

    if policy.exceeds(size) {
        report.oversized += 1;
        return ContentPolicy::too_large_placeholder(name, size);
    }

    match file.read().await {
        Ok(bytes) if policy.exceeds(bytes.len() as u64) => {
            report.oversized += 1;
            ContentPolicy::too_large_placeholder(name, bytes.len() as u64)
        }
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(file = name, error = %e, "Error reading file");
            report.read_failures += 1;
            ContentPolicy::read_failure_placeholder(name)
        }
    }
}
