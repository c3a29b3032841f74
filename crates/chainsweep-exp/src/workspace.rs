//! Artifact naming and removal of transient per-parameter files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chainsweep_core::{ErrorInfo, SweepError};
use serde::{Deserialize, Serialize};

/// Path of the transient result file for parameter `n` under `root`.
pub fn artifact_path(root: &Path, n: u32) -> PathBuf {
    root.join(format!("S_{n}.json"))
}

/// Path of the chart for a sweep whose upper bound is `upper`.
pub fn chart_path(dir: &Path, upper: u32) -> PathBuf {
    dir.join(format!("non_unique_choices_ratio_plot_S_{upper}.svg"))
}

/// Outcome of a successful cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupStatus {
    /// The artifact existed and was deleted.
    Removed,
    /// Nothing was on disk; treated as a no-op.
    AlreadyAbsent,
}

/// Deletes a transient artifact.
///
/// A missing file is not an error. Any other failure is returned as
/// [`SweepError::Cleanup`] so the caller can warn and carry on.
pub async fn clean_artifact(path: &Path) -> Result<CleanupStatus, SweepError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(CleanupStatus::Removed),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(CleanupStatus::AlreadyAbsent),
        Err(err) => {
            let code = if err.kind() == ErrorKind::PermissionDenied {
                "cleanup-denied"
            } else {
                "cleanup-io"
            };
            Err(SweepError::Cleanup(
                ErrorInfo::new(code, "failed to remove transient artifact")
                    .with_context("artifact", path.display().to_string())
                    .with_hint(err.to_string()),
            ))
        }
    }
}
