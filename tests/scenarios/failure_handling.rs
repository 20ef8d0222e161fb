//! Test: Failure Handling - the first failing step stops the deployment

use crate::helpers::*;
use deploy::core::{DeployEvent, DeploymentRequest, FailureCode, StepKind};
use deploy::Decision;

fn request() -> DeploymentRequest {
    DeploymentRequest::new("main", "/app")
        .unwrap()
        .with_database_update(Decision::Forced(true))
        .with_worker_restart(Decision::Forced("queue-worker".to_string()))
}

/// A directory that is not a repository fails before anything else runs
#[tokio::test]
async fn test_not_a_repository_stops_immediately() {
    let executor = RecordingExecutor::new();
    executor.reply(
        "git rev-parse",
        128,
        &["fatal: not a git repository (or any of the parent directories): .git"],
    );

    let run = deploy(executor.clone(), ScriptedPrompter::silent(), &request()).await;

    assert_failed_at(&run.outcome, StepKind::GitUpdate, FailureCode::NotARepository);
    assert_eq!(run.outcome.results.len(), 1);
    assert_eq!(executor.calls().len(), 1);

    let git = &run.outcome.results[0];
    assert_eq!(git.command.as_deref(), Some("git rev-parse --git-dir"));
    assert_eq!(git.exit_code, Some(128));
    assert!(git.output[0].starts_with("fatal: not a git repository"));
}

/// A failed fetch is reported as a checkout failure
#[tokio::test]
async fn test_fetch_failure() {
    let executor = RecordingExecutor::on_branch("main");
    executor.reply("git fetch", 128, &["fatal: 'origin' does not appear to be a git repository"]);

    let run = deploy(executor.clone(), ScriptedPrompter::silent(), &request()).await;

    assert_failed_at(&run.outcome, StepKind::GitUpdate, FailureCode::CheckoutFailed);
    assert!(!executor.ran("git checkout"));
}

/// A failed merge stops the run before dependencies are installed
#[tokio::test]
async fn test_merge_failure_skips_the_rest() {
    let executor = RecordingExecutor::on_branch("main");
    executor.reply("git merge", 1, &["CONFLICT (content): Merge conflict in app.php"]);

    let run = deploy(executor.clone(), ScriptedPrompter::silent(), &request()).await;

    assert_failed_at(&run.outcome, StepKind::GitUpdate, FailureCode::MergeFailed);
    assert!(!executor.ran("composer"));
    assert!(!executor.ran("php"));
    assert!(!executor.ran("supervisorctl"));

    let failure = run.outcome.failure().unwrap();
    assert_eq!(failure.exit_code, Some(1));
    assert_eq!(failure.command.as_deref(), Some("git merge origin/main"));

    let reported = run.events.iter().find_map(|e| match e {
        DeployEvent::StepFailed { command, output, .. } => Some((command.clone(), output.clone())),
        _ => None,
    });
    assert_eq!(
        reported,
        Some((
            Some("git merge origin/main".to_string()),
            vec!["CONFLICT (content): Merge conflict in app.php".to_string()]
        ))
    );
}

/// Failures are reported even when the operator asked for quiet output
#[tokio::test]
async fn test_failures_are_reported_when_quiet() {
    let executor = RecordingExecutor::on_branch("main");
    executor.reply("composer", 2, &["Your requirements could not be resolved"]);
    let request = request().with_verbosity(deploy::Verbosity::Quiet);

    let run = deploy(executor, ScriptedPrompter::silent(), &request).await;

    assert_failed_at(&run.outcome, StepKind::DependencyInstall, FailureCode::DependencyInstallFailed);
    assert_eq!(run.events.len(), 2);
    assert!(matches!(run.events[0], DeployEvent::StepFailed { .. }));
    assert!(matches!(run.events[1], DeployEvent::PipelineCompleted { success: false, .. }));
}

/// A program that cannot be started fails its step with the error as output
#[tokio::test]
async fn test_missing_program_fails_the_step() {
    let executor = RecordingExecutor::on_branch("main");
    executor.fail_to_spawn("supervisorctl");

    let run = deploy(executor, ScriptedPrompter::silent(), &request()).await;

    assert_failed_at(&run.outcome, StepKind::WorkerRestart, FailureCode::RestartFailed);
    let failure = run.outcome.failure().unwrap();
    assert_eq!(failure.exit_code, None);
    assert!(failure.output[0].contains("Failed to start 'supervisorctl'"));
    assert_succeeded(&run.outcome, StepKind::DatabaseMigrate);
}
