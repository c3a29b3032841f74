use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chainsweep_core::{ErrorInfo, RawResult, SweepError, SweepRange};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::engine::Engine;
use crate::invoke::{invoke, InvocationSpec};
use crate::load::load_result;
use crate::workspace::{artifact_path, clean_artifact, CleanupStatus};

/// Scheduler configuration controlling how many engines run at once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scheduler {
    /// Cap on concurrently running engine processes. `None` launches every task at once.
    #[serde(default)]
    pub parallelism: Option<usize>,
}

/// Plan describing one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPlan {
    pub range: SweepRange,
    pub strategy: String,
    #[serde(default)]
    pub scheduler: Scheduler,
}

impl SweepPlan {
    /// Invocation for every parameter value in the range.
    pub fn invocations(&self, engine: &Engine) -> Vec<InvocationSpec> {
        self.range
            .values()
            .map(|n| InvocationSpec::new(n, self.range.start, &*self.strategy, engine.workspace()))
            .collect()
    }
}

/// Branch a task took after its engine was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStage {
    Loaded,
    LoadFailed,
    InvokeFailed,
}

/// Terminal record of one sweep task. Every task ends cleaned, whatever its branch.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub n: u32,
    pub artifact: PathBuf,
    pub result: Result<RawResult, SweepError>,
    pub cleanup: Result<CleanupStatus, SweepError>,
}

impl TaskOutcome {
    pub fn stage(&self) -> TaskStage {
        match &self.result {
            Ok(_) => TaskStage::Loaded,
            Err(SweepError::MissingArtifact(_) | SweepError::MalformedArtifact(_)) => {
                TaskStage::LoadFailed
            }
            Err(_) => TaskStage::InvokeFailed,
        }
    }

    /// Parsed result, present only for [`TaskStage::Loaded`].
    pub fn loaded(&self) -> Option<&RawResult> {
        self.result.as_ref().ok()
    }
}

/// Task outcomes keyed by parameter value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepOutcomes {
    outcomes: BTreeMap<u32, TaskOutcome>,
}

impl SweepOutcomes {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, n: u32) -> Option<&TaskOutcome> {
        self.outcomes.get(&n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &TaskOutcome)> + '_ {
        self.outcomes.iter().map(|(n, outcome)| (*n, outcome))
    }

    /// Number of tasks that produced a parsed result.
    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|outcome| outcome.stage() == TaskStage::Loaded)
            .count()
    }

    fn insert(&mut self, outcome: TaskOutcome) {
        self.outcomes.insert(outcome.n, outcome);
    }
}

impl FromIterator<TaskOutcome> for SweepOutcomes {
    fn from_iter<I: IntoIterator<Item = TaskOutcome>>(iter: I) -> Self {
        let mut outcomes = SweepOutcomes::default();
        for outcome in iter {
            outcomes.insert(outcome);
        }
        outcomes
    }
}

/// Executes one engine invocation per parameter value concurrently.
///
/// Every task runs invoke, load and cleanup independently; a failing task
/// never cancels its siblings. The result holds exactly one outcome per
/// value in the range, in no particular completion order.
pub async fn sweep(engine: Arc<Engine>, plan: &SweepPlan) -> SweepOutcomes {
    let specs = plan.invocations(&engine);
    info!(
        start = plan.range.start,
        end = plan.range.end,
        tasks = specs.len(),
        "launching sweep"
    );
    let limit = plan
        .scheduler
        .parallelism
        .map(|permits| Arc::new(Semaphore::new(permits)));

    let mut tasks = JoinSet::new();
    for spec in specs {
        tasks.spawn(run_task(Arc::clone(&engine), spec, limit.clone()));
    }

    let mut outcomes = SweepOutcomes::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.insert(outcome),
            Err(err) => error!(error = %err, "sweep task aborted"),
        }
    }

    // A task that panicked left no outcome; record it so every n is accounted for.
    for n in plan.range.values() {
        if outcomes.get(n).is_none() {
            outcomes.insert(abandoned_task(&engine, n).await);
        }
    }
    info!(
        requested = plan.range.len(),
        loaded = outcomes.loaded_count(),
        "sweep finished"
    );
    outcomes
}

async fn run_task(
    engine: Arc<Engine>,
    spec: InvocationSpec,
    limit: Option<Arc<Semaphore>>,
) -> TaskOutcome {
    let _permit = match limit {
        Some(semaphore) => semaphore.acquire_owned().await.ok(),
        None => None,
    };
    let n = spec.n();
    debug!(n, "invoking engine");
    let result = match invoke(&engine, &spec).await {
        Ok(status) => {
            debug!(n, %status, "engine finished; loading result");
            load_result(spec.output())
                .await
                .map_err(|err| err.with_context("n", n.to_string()))
        }
        Err(err) => Err(err),
    };
    match &result {
        Ok(_) => debug!(n, "result loaded"),
        Err(err) => warn!(
            n,
            artifact = %spec.output().display(),
            error = %err,
            "skipping parameter"
        ),
    }
    let cleanup = clean_task_artifact(n, spec.output().to_path_buf()).await;
    TaskOutcome {
        n,
        artifact: spec.output().to_path_buf(),
        result,
        cleanup,
    }
}

async fn abandoned_task(engine: &Engine, n: u32) -> TaskOutcome {
    let artifact = artifact_path(engine.workspace(), n);
    let result = Err(SweepError::Invocation(
        ErrorInfo::new("task-panicked", "sweep task terminated without an outcome")
            .with_context("n", n.to_string())
            .with_context("artifact", artifact.display().to_string()),
    ));
    let cleanup = clean_task_artifact(n, artifact.clone()).await;
    TaskOutcome {
        n,
        artifact,
        result,
        cleanup,
    }
}

async fn clean_task_artifact(n: u32, artifact: PathBuf) -> Result<CleanupStatus, SweepError> {
    let cleanup = clean_artifact(&artifact)
        .await
        .map_err(|err| err.with_context("n", n.to_string()));
    match &cleanup {
        Ok(status) => debug!(n, ?status, "artifact cleaned"),
        Err(err) => warn!(n, artifact = %artifact.display(), error = %err, "cleanup failed"),
    }
    cleanup
}
