//! Test: Dry Run - every step is evaluated, nothing is changed

use crate::helpers::*;
use deploy::core::{DeploymentRequest, StepKind};
use deploy::Decision;
use std::fs;

/// Checkout with a frontend and a cache directory, so every step has work
fn full_checkout() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    fs::create_dir_all(dir.path().join("public/cache/translate")).unwrap();
    dir
}

#[tokio::test]
async fn test_only_the_repository_probe_runs() {
    let dir = full_checkout();
    let executor = RecordingExecutor::on_branch("main");
    let request = DeploymentRequest::new("main", dir.path())
        .unwrap()
        .with_dry_run(true)
        .with_database_update(Decision::Forced(true))
        .with_worker_restart(Decision::Forced("queue-worker".to_string()));

    let run = deploy(executor.clone(), ScriptedPrompter::silent(), &request).await;

    assert!(run.outcome.success);
    assert!(run.outcome.dry_run);
    assert_eq!(executor.executed(), vec!["git rev-parse --git-dir".to_string()]);

    // Everything else was handed to the executor as a dry run
    assert!(executor.ran("git fetch origin"));
    assert!(executor.ran("git checkout main"));
    assert!(executor.ran("composer install --no-dev"));
    assert!(executor.ran("npm ci"));
    assert!(executor.ran("apachectl graceful"));
    assert!(executor.ran("find "));
    assert!(executor.ran("supervisorctl restart queue-worker"));

    // Classification would read the pre-checkout HEAD, so neither it nor the merge happen
    assert!(!executor.ran("git branch"));
    assert!(!executor.ran("git merge"));
}

#[tokio::test]
async fn test_skip_decisions_match_a_real_run() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();

    let request = DeploymentRequest::new("main", dir.path()).unwrap();

    let real_prompter = ScriptedPrompter::new(&["y", ""]);
    let real = deploy(RecordingExecutor::on_branch("main"), real_prompter.clone(), &request).await;

    let dry_prompter = ScriptedPrompter::new(&["y", ""]);
    let dry = deploy(
        RecordingExecutor::on_branch("main"),
        dry_prompter.clone(),
        &request.clone().with_dry_run(true),
    )
    .await;

    assert!(real.outcome.success);
    assert!(dry.outcome.success);
    assert_eq!(status_shape(&real.outcome), status_shape(&dry.outcome));
    assert_eq!(real_prompter.asked(), dry_prompter.asked());

    assert_succeeded(&dry.outcome, StepKind::FrontendBuild);
    assert_skipped(&dry.outcome, StepKind::CacheInvalidate);
    assert_succeeded(&dry.outcome, StepKind::DatabaseMigrate);
    assert_skipped(&dry.outcome, StepKind::WorkerRestart);
}

#[tokio::test]
async fn test_dry_run_still_detects_a_missing_repository() {
    let executor = RecordingExecutor::new();
    executor.reply("git rev-parse", 128, &["fatal: not a git repository"]);
    let request = DeploymentRequest::new("main", "/srv/empty").unwrap().with_dry_run(true);

    let run = deploy(executor.clone(), ScriptedPrompter::silent(), &request).await;

    assert_failed_at(&run.outcome, StepKind::GitUpdate, deploy::FailureCode::NotARepository);
    assert_eq!(executor.calls().len(), 1);
}
