//! Multi-project workflow orchestration
//!
//! Sits between the clap arguments in `main.rs` and [VersionLifecycle]:
//! resolves which projects a command targets, runs the command for each of
//! them, prints the per-project report and keeps going when one project
//! fails. Configuration-level errors still abort the whole run.

use anyhow::Result;

use crate::config::Config;
use crate::domain::record::ReleaseFilter;
use crate::domain::schedule::CleanupSettings;
use crate::error::VersionManagerError;
use crate::lifecycle::{CreateRequest, VersionLifecycle};
use crate::tracker::VersionRepository;
use crate::ui;

/// Arguments for the create workflow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateWorkflowArgs {
    /// Single project; all configured projects when absent
    pub project_key: Option<String>,
    pub request: CreateRequest,
}

/// Arguments for the cleanup workflow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupWorkflowArgs {
    pub project_key: Option<String>,
    /// Overrides `[cleanup].min_age_days`
    pub min_age_days: Option<u32>,
    /// Also delete released versions
    pub include_released: bool,
}

/// Arguments for the delete workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteWorkflowArgs {
    pub project_key: String,
    pub name: String,
    pub move_to: Option<String>,
    pub force: bool,
}

/// Arguments for the list workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListWorkflowArgs {
    pub project_key: String,
    pub filter: ReleaseFilter,
    pub with_issues: bool,
}

/// Per-project outcome of a batch command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: Vec<String>,
    /// Project key and the error that stopped it, or a count of failed actions
    pub failed: Vec<(String, String)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Projects a command runs for: the explicit key, else every configured one.
pub fn target_projects(config: &Config, project_key: Option<&str>) -> Result<Vec<String>> {
    match project_key {
        Some(key) if !key.trim().is_empty() => Ok(vec![key.trim().to_string()]),
        _ if config.project_keys.is_empty() => Err(VersionManagerError::config(
            "no project given and project_keys is empty",
        )
        .into()),
        _ => Ok(config.project_keys.clone()),
    }
}

/// Run `step` for every project, isolating per-project failures.
///
/// `step` returns how many of the project's actions failed. Fatal errors
/// (configuration, version flags) stop the batch immediately.
fn run_batch<F>(projects: &[String], mut step: F) -> Result<BatchOutcome>
where
    F: FnMut(&str) -> crate::error::Result<usize>,
{
    let mut outcome = BatchOutcome::default();

    for project in projects {
        match step(project) {
            Ok(0) => outcome.succeeded.push(project.clone()),
            Ok(failures) => outcome
                .failed
                .push((project.clone(), format!("{} action(s) failed", failures))),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping project {}: {}", project, e);
                ui::display_error(&format!("{}: {}", project, e));
                outcome.failed.push((project.clone(), e.to_string()));
            }
        }
    }

    Ok(outcome)
}

/// Create the scheduled (or explicitly dated) versions.
pub fn run_create_workflow<R: VersionRepository>(
    lifecycle: &VersionLifecycle<'_, R>,
    config: &Config,
    args: &CreateWorkflowArgs,
) -> Result<BatchOutcome> {
    // conflicting flags are rejected before any project is touched
    args.request.version.validate()?;

    let projects = target_projects(config, args.project_key.as_deref())?;
    run_batch(&projects, |project| {
        let report = lifecycle.create(project, &args.request)?;
        ui::display_create_report(&report);
        Ok(report.failed.len())
    })
}

/// Delete old unused versions.
pub fn run_cleanup_workflow<R: VersionRepository>(
    lifecycle: &VersionLifecycle<'_, R>,
    config: &Config,
    args: &CleanupWorkflowArgs,
) -> Result<BatchOutcome> {
    let settings = CleanupSettings {
        min_age_days: args.min_age_days.unwrap_or(config.cleanup.min_age_days),
        include_released: args.include_released || config.cleanup.include_released,
    };

    let projects = target_projects(config, args.project_key.as_deref())?;
    run_batch(&projects, |project| {
        let report = lifecycle.cleanup(project, &settings)?;
        ui::display_cleanup_report(&report);
        Ok(report.failed.len())
    })
}

/// Archive old released versions.
pub fn run_archive_workflow<R: VersionRepository>(
    lifecycle: &VersionLifecycle<'_, R>,
    config: &Config,
    project_key: Option<&str>,
) -> Result<BatchOutcome> {
    let projects = target_projects(config, project_key)?;
    run_batch(&projects, |project| {
        let report = lifecycle.archive(project)?;
        ui::display_archive_report(&report);
        Ok(report.failed.len())
    })
}

/// Delete a single version.
pub fn run_delete_workflow<R: VersionRepository>(
    lifecycle: &VersionLifecycle<'_, R>,
    args: &DeleteWorkflowArgs,
) -> Result<()> {
    let report = lifecycle.delete(
        &args.project_key,
        &args.name,
        args.move_to.as_deref(),
        args.force,
    )?;
    ui::display_delete_report(&report);
    Ok(())
}

/// List the versions of one project.
pub fn run_list_workflow<R: VersionRepository>(
    lifecycle: &VersionLifecycle<'_, R>,
    args: &ListWorkflowArgs,
) -> Result<()> {
    let report = lifecycle.list(&args.project_key, args.filter, args.with_issues)?;
    ui::display_version_list(&report);
    Ok(())
}
