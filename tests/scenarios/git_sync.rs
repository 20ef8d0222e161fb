//! Test: Git Sync - merge only when the checkout is on a branch

use crate::helpers::*;
use deploy::core::{DeployConfig, DeploymentRequest, StepKind};
use deploy::GitState;

fn request(reference: &str) -> DeploymentRequest {
    DeploymentRequest::new(reference, "/app")
        .unwrap()
        .with_database_update(deploy::Decision::Forbidden)
        .with_worker_restart(deploy::Decision::Forbidden)
}

/// A branch checkout is fast-forwarded from the remote
#[tokio::test]
async fn test_attached_branch_is_merged() {
    let executor = RecordingExecutor::on_branch("main");

    let run = deploy(executor.clone(), ScriptedPrompter::silent(), &request("main")).await;

    assert!(run.outcome.success);
    assert_succeeded(&run.outcome, StepKind::GitUpdate);
    assert_eq!(
        executor.executed()[..6],
        [
            "git rev-parse --git-dir",
            "git fetch origin",
            "git checkout main",
            "git rev-parse --git-dir",
            "git branch --no-color",
            "git merge origin/main",
        ]
    );

    let git = run.outcome.result_for(StepKind::GitUpdate).unwrap();
    assert_eq!(git.command.as_deref(), Some("git merge origin/main"));
}

/// Tags and raw commits are left exactly as checked out
#[tokio::test]
async fn test_detached_checkouts_are_not_merged() {
    let listings = [
        "* (no branch)",
        "* (no branch, rebasing main)",
        "* (detached from v1.0)",
        "* (HEAD detached at v1.0)",
        "* (HEAD detached from 3f2a9c1)",
    ];

    for listing in listings {
        let executor = RecordingExecutor::detached(listing);

        let run = deploy(executor.clone(), ScriptedPrompter::silent(), &request("v1.0")).await;

        assert!(run.outcome.success, "listing {:?}", listing);
        assert!(!executor.ran("git merge"), "merged for listing {:?}", listing);
        let git = run.outcome.result_for(StepKind::GitUpdate).unwrap();
        assert_eq!(git.command.as_deref(), Some("git checkout v1.0"));
    }
}

/// The merge uses the configured remote
#[tokio::test]
async fn test_configured_remote_is_used() {
    let executor = RecordingExecutor::on_branch("release");
    let config = DeployConfig::from_yaml("remote: upstream\n").unwrap();

    let run = deploy_with_config(executor.clone(), ScriptedPrompter::silent(), &request("release"), config).await;

    assert!(run.outcome.success);
    assert!(executor.ran("git fetch upstream"));
    assert!(executor.ran("git merge upstream/release"));
    assert!(!executor.ran("git fetch origin"));
}

/// Branch names are read from the marked line only
#[test]
fn test_branch_listing_classification() {
    assert_eq!(
        GitState::from_branch_listing("  develop\n* feature/login\n  main"),
        GitState::Attached("feature/login".to_string())
    );
    assert_eq!(GitState::from_branch_listing("* (no branch)\n  main"), GitState::Detached);
    assert_eq!(GitState::from_branch_listing(""), GitState::Detached);
}

/// A translated git still gets its tag checkouts recognised
#[tokio::test]
async fn test_translated_git_output_does_not_trigger_a_merge() {
    let translations = [
        ("* (HEAD detached at v1.0)", "* (HEAD losgelöst bei v1.0)"),
        ("* (HEAD detached at v1.0)", "* (HEAD détachée sur v1.0)"),
        ("* (no branch)", "* (kein Branch)"),
    ];

    for (c_listing, translated) in translations {
        let executor = RecordingExecutor::translated_git(c_listing, translated);

        let run = deploy(executor.clone(), ScriptedPrompter::silent(), &request("v1.0")).await;

        assert!(run.outcome.success, "listing {:?}", translated);
        assert!(!executor.ran("git merge"), "merged for listing {:?}", translated);
    }

    let executor = RecordingExecutor::translated_git("* (HEAD detached at v1.0)", "* (HEAD losgelöst bei v1.0)");
    deploy(executor.clone(), ScriptedPrompter::silent(), &request("v1.0")).await;
    for call in executor.calls().iter().filter(|c| c.command.starts_with("git ")) {
        assert!(
            call.env.contains(&("LC_ALL".to_string(), "C".to_string())),
            "{} not run in the C locale",
            call.command
        );
    }
}
