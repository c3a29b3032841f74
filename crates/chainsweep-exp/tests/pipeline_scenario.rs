#![cfg(unix)]

use std::fs;
use std::sync::Arc;

use chainsweep_core::SweepRange;
use chainsweep_exp::{
    run_sweep_pipeline, Engine, OutputConfig, Scheduler, SweepPlan,
};
use tempfile::tempdir;


use fixtures::{fake_engine, leftover_artifacts, Response};

fn output_in(dir: &std::path::Path) -> OutputConfig {
    OutputConfig {
        directory: dir.join("out"),
        ..OutputConfig::default()
    }
}

fn plan(start: u32, end: u32) -> SweepPlan {
    SweepPlan {
        range: SweepRange::new(start, end),
        strategy: "lru".to_string(),
        scheduler: Scheduler::default(),
    }
}

fn scenario_engine(dir: &std::path::Path) -> Arc<Engine> {
    let script = fake_engine(
        dir,
        &[
            (3, Response::Chain { length: 10, non_unique: 4 }),
            (4, Response::Fail),
            (5, Response::Chain { length: 40, non_unique: 40 }),
        ],
    );
    Arc::new(Engine::new(script, dir))
}

#[tokio::test]
async fn partial_failure_sweep_persists_surviving_rows() {
    let dir = tempdir().unwrap();
    let output = output_in(dir.path());

    let artifacts = run_sweep_pipeline(scenario_engine(dir.path()), &plan(3, 5), &output)
        .await
        .unwrap();

    let rows = artifacts.table.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].n, rows[0].chain_length, rows[0].non_unique_choices), (3, 10, 4));
    assert!((rows[0].ratio - 0.4).abs() < 1e-12);
    assert_eq!((rows[1].n, rows[1].chain_length, rows[1].non_unique_choices), (5, 40, 40));
    assert!((rows[1].ratio - 1.0).abs() < 1e-12);

    let csv = fs::read_to_string(&artifacts.table_path).unwrap();
    assert_eq!(
        csv,
        "n,chain_length,non_unique_choices,ratio\n3,10,4,0.4\n5,40,40,1\n"
    );
    assert!(leftover_artifacts(dir.path()).is_empty());

    let report = &artifacts.report;
    assert_eq!(report.metrics.requested, 3);
    assert_eq!(report.metrics.loaded, 2);
    assert_eq!(report.metrics.skipped, 1);
    let statuses: Vec<&str> = report.jobs.iter().map(|job| job.status.as_str()).collect();
    assert_eq!(statuses, vec!["loaded", "invoke-failed", "loaded"]);
    assert!(report.jobs[1].error.as_deref().unwrap().contains("n=4"));
    assert!(artifacts.report_path.exists());

    let chart = artifacts.chart_path.expect("chart rendered");
    assert!(chart.ends_with("non_unique_choices_ratio_plot_S_5.svg"));
    assert!(fs::metadata(&chart).unwrap().len() > 0);
}

#[tokio::test]
async fn rerunning_overwrites_with_identical_rows() {
    let dir = tempdir().unwrap();
    let output = output_in(dir.path());
    let engine = scenario_engine(dir.path());

    let first = run_sweep_pipeline(Arc::clone(&engine), &plan(3, 5), &output)
        .await
        .unwrap();
    let first_csv = fs::read_to_string(&first.table_path).unwrap();
    let second = run_sweep_pipeline(engine, &plan(3, 5), &output).await.unwrap();
    let second_csv = fs::read_to_string(&second.table_path).unwrap();

    assert_eq!(first.table, second.table);
    assert_eq!(first_csv, second_csv);
    assert_eq!(first.report.plan_hash, second.report.plan_hash);
}

#[tokio::test]
async fn empty_range_produces_empty_outputs() {
    let dir = tempdir().unwrap();
    let output = output_in(dir.path());
    let engine = Arc::new(Engine::new(dir.path().join("unused"), dir.path()));

    let artifacts = run_sweep_pipeline(engine, &plan(3, 2), &output).await.unwrap();

    assert!(artifacts.table.is_empty());
    assert!(artifacts.outcomes.is_empty());
    let csv = fs::read_to_string(&artifacts.table_path).unwrap();
    assert_eq!(csv, "n,chain_length,non_unique_choices,ratio\n");
    let chart = artifacts.chart_path.as_ref().expect("empty chart still renders");
    assert!(chart.ends_with("non_unique_choices_ratio_plot_S_2.svg"));
    assert!(fs::read_to_string(chart).unwrap().contains("<svg"));
    assert_eq!(artifacts.report.metrics.requested, 0);
    assert!(artifacts.report.jobs.is_empty());
}

#[tokio::test]
async fn zero_length_chain_keeps_row_with_nan_ratio() {
    let dir = tempdir().unwrap();
    let script = fake_engine(
        dir.path(),
        &[
            (3, Response::Chain { length: 0, non_unique: 0 }),
            (4, Response::Chain { length: 8, non_unique: 2 }),
        ],
    );
    let output = OutputConfig {
        persist_ratio: false,
        ..output_in(dir.path())
    };

    let artifacts = run_sweep_pipeline(Arc::new(Engine::new(script, dir.path())), &plan(3, 4), &output)
        .await
        .unwrap();

    assert_eq!(artifacts.table.len(), 2);
    assert!(artifacts.table.rows()[0].ratio.is_nan());
    assert_eq!(artifacts.table.rows()[1].ratio, 0.25);
    let csv = fs::read_to_string(&artifacts.table_path).unwrap();
    assert_eq!(csv, "n,chain_length,non_unique_choices\n3,0,0\n4,8,2\n");
}
