//! Test: Confirmation - optional steps follow flags first, then the operator

use crate::helpers::*;
use deploy::core::{DeploymentRequest, StepKind};
use deploy::Decision;

fn request() -> DeploymentRequest {
    DeploymentRequest::new("main", "/app").unwrap()
}

#[tokio::test]
async fn test_forced_database_update_runs_without_prompt() {
    let executor = RecordingExecutor::on_branch("main");
    let prompter = ScriptedPrompter::silent();
    let request = request()
        .with_database_update(Decision::Forced(true))
        .with_worker_restart(Decision::Forbidden);

    let run = deploy(executor.clone(), prompter.clone(), &request).await;

    assert!(run.outcome.success);
    assert_succeeded(&run.outcome, StepKind::DatabaseMigrate);
    assert!(executor.ran("php /app/scripts/build/build.php update"));
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn test_declined_steps_are_skipped() {
    let executor = RecordingExecutor::on_branch("main");
    let prompter = ScriptedPrompter::silent();
    let request = request()
        .with_database_update(Decision::Forced(false))
        .with_worker_restart(Decision::Forbidden);

    let run = deploy(executor.clone(), prompter.clone(), &request).await;

    assert!(run.outcome.success);
    assert_skipped(&run.outcome, StepKind::DatabaseMigrate);
    assert_skipped(&run.outcome, StepKind::WorkerRestart);
    assert!(!executor.ran("php"));
    assert!(!executor.ran("supervisorctl"));
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn test_operator_is_asked_when_nothing_was_decided() {
    let executor = RecordingExecutor::on_branch("main");
    let prompter = ScriptedPrompter::new(&["y", "queue-worker"]);

    let run = deploy(executor.clone(), prompter.clone(), &request()).await;

    assert!(run.outcome.success);
    assert_eq!(
        prompter.asked(),
        vec![
            "Run the database update? [y/N] ".to_string(),
            "Name of the worker to restart (leave empty to skip step): ".to_string(),
        ]
    );
    assert!(executor.ran("php /app/scripts/build/build.php update"));
    assert!(executor.ran("supervisorctl restart queue-worker"));
}

#[tokio::test]
async fn test_default_answers_skip_optional_steps() {
    let executor = RecordingExecutor::on_branch("main");
    let prompter = ScriptedPrompter::new(&["", ""]);

    let run = deploy(executor.clone(), prompter.clone(), &request()).await;

    assert!(run.outcome.success);
    assert_eq!(prompter.asked().len(), 2);
    assert_skipped(&run.outcome, StepKind::DatabaseMigrate);
    assert_skipped(&run.outcome, StepKind::WorkerRestart);
}
