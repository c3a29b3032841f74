use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use chainsweep_core::{ErrorInfo, SweepError};
use tokio::process::Command;
use tokio::time::timeout;

use crate::engine::Engine;
use crate::workspace::artifact_path;

/// Immutable description of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    n: u32,
    rankings: Vec<u32>,
    strategy: String,
    output: PathBuf,
}

impl InvocationSpec {
    /// Builds the invocation for order `n` with rankings `lower..=n`.
    pub fn new(n: u32, lower: u32, strategy: impl Into<String>, workspace: &Path) -> Self {
        Self {
            n,
            rankings: (lower..=n).collect(),
            strategy: strategy.into(),
            output: artifact_path(workspace, n),
        }
    }

    /// Symmetric-group order.
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Eviction strategy identifier.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Transient artifact the engine is told to write.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Comma-separated ranking set, e.g. `3,4,5`.
    pub fn rankings_arg(&self) -> String {
        self.rankings
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Full argument vector following the subcommand contract.
    pub fn arguments(&self, subcommand: &str) -> Vec<OsString> {
        vec![
            subcommand.into(),
            "-s".into(),
            self.n.to_string().into(),
            "-l".into(),
            self.strategy.clone().into(),
            "-c".into(),
            self.rankings_arg().into(),
            "-o".into(),
            self.output.clone().into_os_string(),
        ]
    }

    fn error_info(&self, code: &str, message: &str) -> ErrorInfo {
        ErrorInfo::new(code, message)
            .with_context("n", self.n.to_string())
            .with_context("artifact", self.output.display().to_string())
    }
}

/// Runs the engine for one parameter value and waits for it to exit.
///
/// Stdout is discarded; stderr is captured only to enrich failures. A
/// timed-out child is killed when its handle drops.
pub async fn invoke(engine: &Engine, spec: &InvocationSpec) -> Result<ExitStatus, SweepError> {
    let mut command = Command::new(engine.binary());
    command
        .args(spec.arguments(engine.subcommand()))
        .current_dir(engine.root())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn().map_err(|err| {
        SweepError::Invocation(
            spec.error_info("engine-spawn", "failed to launch engine")
                .with_hint(err.to_string()),
        )
    })?;

    let waited = match engine.timeout() {
        Some(limit) => timeout(limit, child.wait_with_output()).await.map_err(|_| {
            SweepError::TimedOut(
                spec.error_info("engine-timeout", "engine exceeded the invocation timeout")
                    .with_context("timeout_secs", limit.as_secs().to_string()),
            )
        })?,
        None => child.wait_with_output().await,
    };
    let output = waited.map_err(|err| {
        SweepError::Invocation(
            spec.error_info("engine-wait", "failed to wait for engine")
                .with_hint(err.to_string()),
        )
    })?;

    if output.status.success() {
        return Ok(output.status);
    }
    let mut info = spec
        .error_info("engine-exit", "engine exited unsuccessfully")
        .with_context("status", output.status.to_string());
    let stderr = String::from_utf8_lossy(&output.stderr);
    if let Some(line) = stderr.lines().rev().find(|line| !line.trim().is_empty()) {
        info = info.with_hint(line.trim().to_string());
    }
    Err(SweepError::Invocation(info))
}
