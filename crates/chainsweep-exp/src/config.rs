use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chainsweep_core::{ErrorInfo, SweepError, SweepRange};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::sweep::{Scheduler, SweepPlan};

/// YAML-configurable parameters governing a sweep.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Location and command-line contract of the external engine.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Release build performed once before the sweep.
    #[serde(default)]
    pub build: BuildConfig,
    /// Lower bound and scheduling of the sweep.
    #[serde(default)]
    pub sweep: SweepSection,
    /// Durable and transient artifact locations.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Engine location and invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Build root of the engine; child processes run with this working directory.
    #[serde(default = "default_engine_root")]
    pub root: PathBuf,
    /// Engine executable, relative to `root` unless absolute.
    #[serde(default = "default_engine_binary")]
    pub binary: PathBuf,
    /// Subcommand selecting the chain-finding algorithm.
    #[serde(default = "default_subcommand")]
    pub subcommand: String,
    /// Eviction strategy identifier passed to every invocation.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Optional per-invocation timeout in seconds. Absent means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_engine_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_engine_binary() -> PathBuf {
    PathBuf::from("target/release/reperm_gen")
}

fn default_subcommand() -> String {
    "find-chain".to_string()
}

fn default_strategy() -> String {
    "lru".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: default_engine_root(),
            binary: default_engine_binary(),
            subcommand: default_subcommand(),
            strategy: default_strategy(),
            timeout_secs: None,
        }
    }
}

impl EngineConfig {
    /// Resolved path of the engine executable.
    pub fn binary_path(&self) -> PathBuf {
        if self.binary.is_absolute() {
            self.binary.clone()
        } else {
            self.root.join(&self.binary)
        }
    }

    /// Per-invocation timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Build step executed synchronously before any sweep task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Whether to run the build command at all.
    #[serde(default = "default_build_enabled")]
    pub enabled: bool,
    /// Program and arguments of the build command.
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,
}

fn default_build_enabled() -> bool {
    true
}

fn default_build_command() -> Vec<String> {
    vec!["cargo".into(), "build".into(), "--release".into()]
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            enabled: default_build_enabled(),
            command: default_build_command(),
        }
    }
}

/// Sweep bounds that are not taken from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSection {
    /// Fixed lower bound of every sweep.
    #[serde(default = "default_lower")]
    pub lower: u32,
    /// Concurrency settings.
    #[serde(default)]
    pub scheduler: Scheduler,
}

fn default_lower() -> u32 {
    3
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            lower: default_lower(),
            scheduler: Scheduler::default(),
        }
    }
}

/// Artifact locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the table, chart and sweep report.
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    /// Directory receiving transient per-parameter artifacts. Defaults to the engine root.
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    /// File name of the durable table.
    #[serde(default = "default_table")]
    pub table: String,
    /// Append the derived ratio column to the durable table.
    #[serde(default = "default_persist_ratio")]
    pub persist_ratio: bool,
    /// File name of the sweep report.
    #[serde(default = "default_report")]
    pub report: String,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_table() -> String {
    "output.csv".to_string()
}

fn default_persist_ratio() -> bool {
    true
}

fn default_report() -> String {
    "sweep_report.json".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            workspace: None,
            table: default_table(),
            persist_ratio: default_persist_ratio(),
            report: default_report(),
        }
    }
}

impl OutputConfig {
    /// Path of the durable table.
    pub fn table_path(&self) -> PathBuf {
        self.directory.join(&self.table)
    }

    /// Path of the sweep report.
    pub fn report_path(&self) -> PathBuf {
        self.directory.join(&self.report)
    }
}

impl SweepConfig {
    /// Loads and validates a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let text = fs::read_to_string(path).map_err(|err| {
            SweepError::Config(
                ErrorInfo::new("config-read", "failed to read sweep configuration")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        let config: SweepConfig = serde_yaml::from_str(&text).map_err(|err| {
            SweepError::Config(
                ErrorInfo::new("config-parse", "failed to parse sweep configuration")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make the sweep meaningless.
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.sweep.lower == 0 {
            return Err(invalid("sweep.lower", "lower bound must be at least 1"));
        }
        if self.sweep.scheduler.parallelism == Some(0) {
            return Err(invalid(
                "sweep.scheduler.parallelism",
                "parallelism must be positive when set",
            ));
        }
        let parallelism = self.sweep.scheduler.parallelism;
        if matches!(parallelism, Some(permits) if permits > Semaphore::MAX_PERMITS) {
            return Err(invalid(
                "sweep.scheduler.parallelism",
                "parallelism exceeds the scheduler's permit limit",
            ));
        }
        if self.engine.timeout_secs == Some(0) {
            return Err(invalid("engine.timeout_secs", "timeout must be positive when set"));
        }
        if self.engine.strategy.trim().is_empty() {
            return Err(invalid("engine.strategy", "strategy must not be empty"));
        }
        if self.build.enabled && self.build.command.is_empty() {
            return Err(invalid("build.command", "build command must not be empty"));
        }
        Ok(())
    }

    /// Directory receiving transient artifacts.
    pub fn workspace(&self) -> PathBuf {
        self.output
            .workspace
            .clone()
            .unwrap_or_else(|| self.engine.root.clone())
    }

    /// Sweep plan for the given upper bound.
    pub fn plan(&self, upper: u32) -> SweepPlan {
        SweepPlan {
            range: SweepRange::new(self.sweep.lower, upper),
            strategy: self.engine.strategy.clone(),
            scheduler: self.sweep.scheduler.clone(),
        }
    }
}

fn invalid(field: &str, message: &str) -> SweepError {
    SweepError::Config(ErrorInfo::new("config-invalid", message).with_context("field", field))
}
