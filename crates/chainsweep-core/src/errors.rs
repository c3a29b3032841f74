//! Structured error types shared across chainsweep crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`SweepError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (parameter value, artifact path, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for sweep orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SweepError {
    /// The engine could not be built or is absent after the build step.
    #[error("build error: {0}")]
    Build(ErrorInfo),
    /// The engine could not be spawned or exited with a non-zero status.
    #[error("invocation error: {0}")]
    Invocation(ErrorInfo),
    /// The engine did not finish within the configured timeout.
    #[error("timeout: {0}")]
    TimedOut(ErrorInfo),
    /// The engine finished but its output artifact is not on disk.
    #[error("missing artifact: {0}")]
    MissingArtifact(ErrorInfo),
    /// The output artifact exists but does not match the result schema.
    #[error("malformed artifact: {0}")]
    MalformedArtifact(ErrorInfo),
    /// A transient artifact could not be removed.
    #[error("cleanup error: {0}")]
    Cleanup(ErrorInfo),
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Durable table or report could not be written.
    #[error("persist error: {0}")]
    Persist(ErrorInfo),
    /// The chart could not be rendered.
    #[error("render error: {0}")]
    Render(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl SweepError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SweepError::Build(info)
            | SweepError::Invocation(info)
            | SweepError::TimedOut(info)
            | SweepError::MissingArtifact(info)
            | SweepError::MalformedArtifact(info)
            | SweepError::Cleanup(info)
            | SweepError::Config(info)
            | SweepError::Persist(info)
            | SweepError::Render(info)
            | SweepError::Serde(info) => info,
        }
    }

    /// Adds a context entry to the payload, whatever the variant.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let info = match &mut self {
            SweepError::Build(info)
            | SweepError::Invocation(info)
            | SweepError::TimedOut(info)
            | SweepError::MissingArtifact(info)
            | SweepError::MalformedArtifact(info)
            | SweepError::Cleanup(info)
            | SweepError::Config(info)
            | SweepError::Persist(info)
            | SweepError::Render(info)
            | SweepError::Serde(info) => info,
        };
        info.context.insert(key.into(), value.into());
        self
    }

    /// Returns `true` for failures contained within a single sweep task.
    ///
    /// Task-local errors skip one parameter value and never abort the sweep.
    pub fn is_task_local(&self) -> bool {
        matches!(
            self,
            SweepError::Invocation(_)
                | SweepError::TimedOut(_)
                | SweepError::MissingArtifact(_)
                | SweepError::MalformedArtifact(_)
                | SweepError::Cleanup(_)
        )
    }

    /// Short kebab-case label used in persisted sweep reports.
    pub fn label(&self) -> &'static str {
        match self {
            SweepError::Build(_) => "build-failed",
            SweepError::Invocation(_) => "invoke-failed",
            SweepError::TimedOut(_) => "timed-out",
            SweepError::MissingArtifact(_) => "missing-artifact",
            SweepError::MalformedArtifact(_) => "malformed-artifact",
            SweepError::Cleanup(_) => "cleanup-failed",
            SweepError::Config(_) => "config-invalid",
            SweepError::Persist(_) => "persist-failed",
            SweepError::Render(_) => "render-failed",
            SweepError::Serde(_) => "serde-failed",
        }
    }
}
