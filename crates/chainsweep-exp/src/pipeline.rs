use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chainsweep_core::{ErrorInfo, SweepError};
use tracing::{info, warn};

use crate::aggregate::SummaryTable;
use crate::config::OutputConfig;
use crate::engine::Engine;
use crate::plot::render_chart;
use crate::report::SweepReport;
use crate::sweep::{sweep, SweepOutcomes, SweepPlan};
use crate::workspace::chart_path;

/// Everything a finished sweep produced.
#[derive(Debug, Clone)]
pub struct SweepArtifacts {
    pub outcomes: SweepOutcomes,
    pub table: SummaryTable,
    pub report: SweepReport,
    pub table_path: PathBuf,
    pub report_path: PathBuf,
    /// `None` when the chart could not be rendered.
    pub chart_path: Option<PathBuf>,
}

/// Fans out the sweep, then aggregates and persists once every task has joined.
///
/// Per-task failures only drop rows. Errors returned here come from writing
/// the durable table or report.
pub async fn run_sweep_pipeline(
    engine: Arc<Engine>,
    plan: &SweepPlan,
    output: &OutputConfig,
) -> Result<SweepArtifacts, SweepError> {
    let outcomes = sweep(engine, plan).await;
    let table = SummaryTable::from_outcomes(&outcomes);
    let report = SweepReport::from_outcomes(plan, &outcomes)?;

    fs::create_dir_all(&output.directory).map_err(|err| {
        SweepError::Persist(
            ErrorInfo::new("output-create", "failed to create output directory")
                .with_context("path", output.directory.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;

    let table_path = output.table_path();
    table.write_csv(&table_path, output.persist_ratio)?;
    info!(path = %table_path.display(), rows = table.len(), "table written");
    if table.is_empty() {
        warn!(
            start = plan.range.start,
            end = plan.range.end,
            "no parameter produced a row; the table and chart are empty"
        );
    }

    let chart = chart_path(&output.directory, plan.range.end);
    let chart_path = match render_chart(&table, &chart) {
        Ok(()) => Some(chart),
        Err(err) => {
            warn!(error = %err, "chart not written");
            None
        }
    };

    let report_path = output.report_path();
    report.write(&report_path)?;
    info!(
        path = %report_path.display(),
        loaded = report.metrics.loaded,
        skipped = report.metrics.skipped,
        "sweep report written"
    );

    Ok(SweepArtifacts {
        outcomes,
        table,
        report,
        table_path,
        report_path,
        chart_path,
    })
}
