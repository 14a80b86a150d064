use chrono::NaiveDate;
use jira_version_manager::cli::orchestration::{
    run_archive_workflow, run_cleanup_workflow, run_create_workflow, target_projects,
    CleanupWorkflowArgs, CreateWorkflowArgs,
};
use jira_version_manager::config::Config;
use jira_version_manager::domain::version::{VersionBump, VersionSpec};
use jira_version_manager::lifecycle::{CreateRequest, VersionLifecycle};
use jira_version_manager::tracker::MockTracker;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dated_create(project_key: Option<&str>) -> CreateWorkflowArgs {
    CreateWorkflowArgs {
        project_key: project_key.map(str::to_string),
        request: CreateRequest {
            date: Some(date(2024, 1, 2)),
            ..CreateRequest::default()
        },
    }
}

#[test]
fn test_target_projects_explicit_and_configured() {
    let config = Config::default();
    assert_eq!(target_projects(&config, Some("OPS")).unwrap(), vec!["OPS"]);
    assert_eq!(
        target_projects(&config, None).unwrap(),
        vec!["PROJECT1", "PROJECT2"]
    );

    let empty = Config {
        project_keys: vec![],
        ..Config::default()
    };
    assert!(target_projects(&empty, None).is_err());
}

#[test]
fn test_create_workflow_runs_every_project() {
    let config = Config::default();
    let registry = config.validate().unwrap();
    let tracker = MockTracker::new();
    let lifecycle = VersionLifecycle::new(&tracker, &config, &registry);

    let outcome = run_create_workflow(&lifecycle, &config, &dated_create(None)).unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.succeeded, vec!["PROJECT1", "PROJECT2"]);
    assert_eq!(tracker.versions("PROJECT1")[0].name, "PROJECT1.W01.2024.01.02");
    assert_eq!(tracker.versions("PROJECT2")[0].name, "PROJECT2.W01.2024.01.02");
}

#[test]
fn test_create_workflow_isolates_failing_project() {
    let config = Config::default();
    let registry = config.validate().unwrap();
    let tracker = MockTracker::new();
    tracker.fail_project("PROJECT1");
    let lifecycle = VersionLifecycle::new(&tracker, &config, &registry);

    let outcome = run_create_workflow(&lifecycle, &config, &dated_create(None)).unwrap();

    assert!(!outcome.is_success());
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, "PROJECT1");
    assert_eq!(outcome.succeeded, vec!["PROJECT2"]);
    assert_eq!(tracker.versions("PROJECT2").len(), 1);
}

#[test]
fn test_create_workflow_rejects_conflicting_flags_before_any_call() {
    let config = Config::default();
    let registry = config.validate().unwrap();
    let tracker = MockTracker::new();
    let lifecycle = VersionLifecycle::new(&tracker, &config, &registry);

    let args = CreateWorkflowArgs {
        project_key: None,
        request: CreateRequest {
            formats: Some(vec!["semver".to_string()]),
            version: VersionSpec {
                bump: Some(VersionBump::Major),
                patch: Some(5),
                ..VersionSpec::default()
            },
            ..CreateRequest::default()
        },
    };

    assert!(run_create_workflow(&lifecycle, &config, &args).is_err());
    assert!(tracker.calls().is_empty());
}

#[test]
fn test_cleanup_workflow_uses_cli_overrides() {
    let config = Config::default();
    let registry = config.validate().unwrap();
    let tracker = MockTracker::new().with_version("PROJECT1", "PROJECT1.W01.2024.01.02");
    let lifecycle = VersionLifecycle::new(&tracker, &config, &registry).with_today(date(2024, 1, 15));

    let strict = CleanupWorkflowArgs {
        project_key: Some("PROJECT1".to_string()),
        min_age_days: Some(30),
        include_released: false,
    };
    run_cleanup_workflow(&lifecycle, &config, &strict).unwrap();
    assert_eq!(tracker.versions("PROJECT1").len(), 1);

    let default_age = CleanupWorkflowArgs {
        project_key: Some("PROJECT1".to_string()),
        ..CleanupWorkflowArgs::default()
    };
    let outcome = run_cleanup_workflow(&lifecycle, &config, &default_age).unwrap();
    assert!(outcome.is_success());
    assert!(tracker.versions("PROJECT1").is_empty());
}

#[test]
fn test_archive_workflow_single_project() {
    let config = Config::default();
    let registry = config.validate().unwrap();
    let tracker = MockTracker::new();
    let lifecycle = VersionLifecycle::new(&tracker, &config, &registry).with_dry_run(true);

    let outcome = run_archive_workflow(&lifecycle, &config, Some("PROJECT2")).unwrap();
    assert_eq!(outcome.succeeded, vec!["PROJECT2"]);
    assert!(tracker.writes().is_empty());
}
