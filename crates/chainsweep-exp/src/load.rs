use std::io::ErrorKind;
use std::path::Path;

use chainsweep_core::{ErrorInfo, RawResult, SweepError};

/// Reads and parses the result file the engine wrote for one parameter value.
///
/// Returns [`SweepError::MissingArtifact`] when the file cannot be read and
/// [`SweepError::MalformedArtifact`] when it is not valid JSON or lacks the
/// `chain_data.length_chain` / `chain_data.length_non_unique` fields.
pub async fn load_result(path: &Path) -> Result<RawResult, SweepError> {
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        let code = if err.kind() == ErrorKind::NotFound {
            "artifact-absent"
        } else {
            "artifact-unreadable"
        };
        SweepError::MissingArtifact(
            ErrorInfo::new(code, "engine output artifact is not available")
                .with_context("artifact", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    parse_result(&bytes).map_err(|info| {
        SweepError::MalformedArtifact(info.with_context("artifact", path.display().to_string()))
    })
}

fn parse_result(bytes: &[u8]) -> Result<RawResult, ErrorInfo> {
    serde_json::from_slice(bytes).map_err(|err| {
        let message = if err.is_data() {
            "result document lacks the expected chain_data fields"
        } else {
            "result document is not valid JSON"
        };
        ErrorInfo::new("artifact-parse", message).with_hint(err.to_string())
    })
}
