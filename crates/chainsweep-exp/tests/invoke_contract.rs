use std::fs;
use std::path::Path;
use std::time::Duration;

use chainsweep_core::SweepError;
use chainsweep_exp::{artifact_path, invoke, Engine, InvocationSpec};
use tempfile::tempdir;


use fixtures::{fake_engine, recording_engine, Response};

#[test]
fn spec_follows_command_line_contract() {
    let spec = InvocationSpec::new(5, 3, "lru", Path::new("/work"));
    assert_eq!(spec.n(), 5);
    assert_eq!(spec.rankings_arg(), "3,4,5");
    assert_eq!(spec.output(), artifact_path(Path::new("/work"), 5));
    let args: Vec<String> = spec
        .arguments("find-chain")
        .into_iter()
        .map(|arg| arg.to_string_lossy().to_string())
        .collect();
    assert_eq!(
        args,
        vec!["find-chain", "-s", "5", "-l", "lru", "-c", "3,4,5", "-o", "/work/S_5.json"]
    );
}

#[test]
fn lowest_order_ranks_only_itself() {
    let spec = InvocationSpec::new(3, 3, "lru", Path::new("."));
    assert_eq!(spec.rankings_arg(), "3");
}

#[cfg(unix)]
#[tokio::test]
async fn engine_runs_in_build_root_with_contract_arguments() {
    let dir = tempdir().unwrap();
    let engine = Engine::new(recording_engine(dir.path()), dir.path());
    let spec = InvocationSpec::new(5, 3, "lru", dir.path());

    let status = invoke(&engine, &spec).await.unwrap();
    assert!(status.success());

    let args = fs::read_to_string(dir.path().join("args_5.txt")).unwrap();
    let expected = format!("find-chain -s 5 -l lru -c 3,4,5 -o {}", spec.output().display());
    assert_eq!(args.trim(), expected);
    let cwd = fs::read_to_string(dir.path().join("cwd_5.txt")).unwrap();
    assert_eq!(
        Path::new(cwd.trim()).canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
    assert!(spec.output().exists());
}

#[cfg(unix)]
#[tokio::test]
async fn non_zero_exit_is_an_invocation_failure() {
    let dir = tempdir().unwrap();
    let engine = Engine::new(fake_engine(dir.path(), &[(4, Response::Fail)]), dir.path());
    let spec = InvocationSpec::new(4, 3, "lru", dir.path());

    let err = invoke(&engine, &spec).await.unwrap_err();
    match &err {
        SweepError::Invocation(info) => {
            assert_eq!(info.code, "engine-exit");
            assert_eq!(info.context.get("n").map(String::as_str), Some("4"));
            assert_eq!(info.hint.as_deref(), Some("engine failed for 4"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_task_local());
}

#[tokio::test]
async fn missing_executable_fails_to_spawn() {
    let dir = tempdir().unwrap();
    let engine = Engine::new(dir.path().join("does-not-exist"), dir.path());
    let spec = InvocationSpec::new(3, 3, "lru", dir.path());

    let err = invoke(&engine, &spec).await.unwrap_err();
    assert!(matches!(&err, SweepError::Invocation(info) if info.code == "engine-spawn"));
}

#[cfg(unix)]
#[tokio::test]
async fn slow_engine_times_out() {
    let dir = tempdir().unwrap();
    let engine = Engine::new(fake_engine(dir.path(), &[(6, Response::Hang(5))]), dir.path())
        .with_timeout(Some(Duration::from_millis(300)));
    let spec = InvocationSpec::new(6, 3, "lru", dir.path());

    let err = invoke(&engine, &spec).await.unwrap_err();
    assert!(matches!(&err, SweepError::TimedOut(info) if info.code == "engine-timeout"));
}
