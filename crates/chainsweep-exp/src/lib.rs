//! Concurrent sweep orchestration over an external chain-finding engine.

mod aggregate;
mod canonical;
mod config;
mod engine;
mod hash;
mod invoke;
mod load;
mod pipeline;
mod plot;
mod report;
mod sweep;
mod workspace;

pub use aggregate::{choice_ratio, SummaryRow, SummaryTable, SweepRow};
pub use config::{BuildConfig, EngineConfig, OutputConfig, SweepConfig, SweepSection};
pub use engine::{prepare_engine, Engine};
pub use hash::stable_hash_string;
pub use invoke::{invoke, InvocationSpec};
pub use load::load_result;
pub use pipeline::{run_sweep_pipeline, SweepArtifacts};
pub use plot::{
    ratio_points, render_chart, x_bounds, x_tick_label, y_upper, CHART_TITLE, X_LABEL, Y_LABEL,
};
pub use report::{SweepJobReport, SweepMetrics, SweepReport};
pub use sweep::{sweep, Scheduler, SweepOutcomes, SweepPlan, TaskOutcome, TaskStage};
pub use workspace::{artifact_path, chart_path, clean_artifact, CleanupStatus};

pub use canonical::to_canonical_json_bytes;
