//! Scenario-based tests for the deployment pipeline


mod confirmation;
mod dry_run;
mod failure_handling;
mod git_sync;
