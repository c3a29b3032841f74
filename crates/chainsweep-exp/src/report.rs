use std::fs;
use std::path::Path;

use chainsweep_core::{ErrorInfo, SweepError};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::canonical::to_canonical_json_bytes;
use crate::hash::stable_hash_string;
use crate::sweep::{SweepOutcomes, SweepPlan};
use crate::workspace::CleanupStatus;

/// Per-parameter entry of a sweep report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepJobReport {
    pub n: u32,
    pub status: String,
    pub artifact: String,
    pub cleanup: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counters summarising a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepMetrics {
    pub requested: usize,
    pub loaded: usize,
    pub skipped: usize,
    pub cleanup_failures: usize,
}

/// Aggregate sweep report persisted next to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub plan_hash: String,
    pub created_at: String,
    pub jobs: Vec<SweepJobReport>,
    pub metrics: SweepMetrics,
}

impl SweepReport {
    /// Summarises outcomes in ascending order of `n`.
    pub fn from_outcomes(plan: &SweepPlan, outcomes: &SweepOutcomes) -> Result<Self, SweepError> {
        let plan_hash = stable_hash_string(plan)?;
        let jobs: Vec<SweepJobReport> = outcomes
            .iter()
            .map(|(n, outcome)| SweepJobReport {
                n,
                status: match &outcome.result {
                    Ok(_) => "loaded".to_string(),
                    Err(err) => err.label().to_string(),
                },
                artifact: outcome.artifact.display().to_string(),
                cleanup: match &outcome.cleanup {
                    Ok(status) => cleanup_label(*status).to_string(),
                    Err(_) => "failed".to_string(),
                },
                error: outcome.result.as_ref().err().map(ToString::to_string),
            })
            .collect();
        let loaded = outcomes.loaded_count();
        let cleanup_failures = outcomes
            .iter()
            .filter(|(_, outcome)| outcome.cleanup.is_err())
            .count();
        Ok(Self {
            plan_hash,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            metrics: SweepMetrics {
                requested: plan.range.len(),
                loaded,
                skipped: jobs.len() - loaded,
                cleanup_failures,
            },
            jobs,
        })
    }

    /// Writes the report as canonical JSON.
    pub fn write(&self, path: &Path) -> Result<(), SweepError> {
        let bytes = to_canonical_json_bytes(self)?;
        fs::write(path, bytes).map_err(|err| {
            SweepError::Persist(
                ErrorInfo::new("report-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

fn cleanup_label(status: CleanupStatus) -> &'static str {
    match status {
        CleanupStatus::Removed => "removed",
        CleanupStatus::AlreadyAbsent => "already-absent",
    }
}
