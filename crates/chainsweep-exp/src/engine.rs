use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use chainsweep_core::{ErrorInfo, SweepError};
use tracing::info;

use crate::config::SweepConfig;

/// Resolved handle to a built engine.
///
/// Holds everything a sweep task needs to launch one invocation; shared
/// read-only across tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    binary: PathBuf,
    root: PathBuf,
    workspace: PathBuf,
    subcommand: String,
    timeout: Option<Duration>,
}

impl Engine {
    /// Creates an engine handle. Transient artifacts default to `root`.
    ///
    /// Relative paths are resolved against the current directory here, since
    /// every child process runs with `root` as its working directory.
    pub fn new(binary: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        let root = absolute(root.into());
        Self {
            binary: absolute(binary.into()),
            workspace: root.clone(),
            root,
            subcommand: "find-chain".to_string(),
            timeout: None,
        }
    }

    /// Overrides the directory receiving transient artifacts.
    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = absolute(workspace.into());
        self
    }

    /// Overrides the algorithm subcommand.
    pub fn with_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = subcommand.into();
        self
    }

    /// Sets a per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds an engine handle from configuration without touching the filesystem.
    pub fn from_config(config: &SweepConfig) -> Self {
        Engine::new(config.engine.binary_path(), config.engine.root.clone())
            .with_workspace(config.workspace())
            .with_subcommand(config.engine.subcommand.clone())
            .with_timeout(config.engine.timeout())
    }

    /// Engine executable.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Working directory of every child process.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory receiving transient artifacts.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Algorithm subcommand.
    pub fn subcommand(&self) -> &str {
        &self.subcommand
    }

    /// Per-invocation timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Checks once that the executable exists.
    pub fn ensure_available(&self) -> Result<(), SweepError> {
        if self.binary.is_file() {
            Ok(())
        } else {
            Err(SweepError::Build(
                ErrorInfo::new("engine-missing", "engine executable not found")
                    .with_context("path", self.binary.display().to_string())
                    .with_hint("build the engine in release mode before sweeping"),
            ))
        }
    }
}

/// Runs the configured build step and returns a verified engine handle.
///
/// Runs synchronously; no sweep task exists yet. Any failure here is fatal.
pub fn prepare_engine(config: &SweepConfig) -> Result<Engine, SweepError> {
    if config.build.enabled {
        run_build(&config.build.command, &config.engine.root)?;
    }
    let engine = Engine::from_config(config);
    engine.ensure_available()?;
    Ok(engine)
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn run_build(command: &[String], root: &Path) -> Result<(), SweepError> {
    let Some((program, args)) = command.split_first() else {
        return Err(SweepError::Build(ErrorInfo::new(
            "build-command",
            "build command is empty",
        )));
    };
    info!(command = %command.join(" "), root = %root.display(), "building engine");
    let status = Command::new(program)
        .args(args)
        .current_dir(root)
        .status()
        .map_err(|err| {
            SweepError::Build(
                ErrorInfo::new("build-spawn", "failed to launch build command")
                    .with_context("program", program.clone())
                    .with_context("root", root.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
    if !status.success() {
        return Err(SweepError::Build(
            ErrorInfo::new("build-exit", "build command failed")
                .with_context("command", command.join(" "))
                .with_context("status", status.to_string()),
        ));
    }
    Ok(())
}
