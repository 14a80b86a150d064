//! Version lifecycle operations
//!
//! [VersionLifecycle] combines the configured templates, the release
//! schedule and the retention rules with what the tracker reports, and turns
//! them into create, delete and update calls. In dry-run mode every mutating
//! call is computed and reported but never sent.

pub mod report;

pub use report::{
    ActionFailure, ArchiveReport, CleanupReport, CreateReport, DeleteReport, ListReport,
    ListedVersion,
};

use crate::config::Config;
use crate::domain::record::{IssueDisposition, ReleaseFilter, VersionRecord, VersionUpdate};
use crate::domain::schedule::{is_due_for_archive, is_due_for_cleanup, CleanupSettings};
use crate::domain::template::{ScanMatch, TemplateRegistry, TemplateSet, VersionFields};
use crate::domain::version::{SemanticVersion, VersionSpec};
use crate::error::{Result, VersionManagerError};
use crate::tracker::VersionRepository;
use crate::warning::LifecycleWarning;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Options of one `create` invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRequest {
    /// Create for this date only instead of the schedule
    pub date: Option<NaiveDate>,
    /// Template ids overriding the project's configured ones
    pub formats: Option<Vec<String>>,
    /// Schedule the current month instead of the next one
    pub current_month: bool,
    pub version: VersionSpec,
}

/// Runs lifecycle operations for any project against one tracker
pub struct VersionLifecycle<'a, R: VersionRepository> {
    tracker: &'a R,
    config: &'a Config,
    registry: &'a TemplateRegistry,
    dry_run: bool,
    today: NaiveDate,
}

impl<'a, R: VersionRepository> VersionLifecycle<'a, R> {
    pub fn new(tracker: &'a R, config: &'a Config, registry: &'a TemplateRegistry) -> Self {
        VersionLifecycle {
            tracker,
            config,
            registry,
            dry_run: false,
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reference date for scheduling and age checks
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn project_templates(&self, project: &str) -> Result<TemplateSet> {
        self.registry.select(&self.config.templates_for(project))
    }

    /// Create the versions a project should have.
    ///
    /// Names are rendered for every target date and every active template,
    /// deduplicated in order, and created unless the tracker already has
    /// them. Existing names are reported with their issues of the configured
    /// types. A name the tracker rejects is recorded as a failure and the
    /// remaining names are still attempted.
    ///
    /// # Returns
    /// * `Err(InvalidVersionSpec)` - Conflicting semantic flags
    /// * `Err(Config)` - Unknown template id in `formats`
    /// * `Err(Template)` - No active template could render a name
    pub fn create(&self, project: &str, request: &CreateRequest) -> Result<CreateReport> {
        request.version.validate()?;

        let templates = match &request.formats {
            Some(ids) => self.registry.select(ids)?,
            None => self.project_templates(project)?,
        };

        let dates = match request.date {
            Some(date) => vec![date],
            None => {
                let schedule = self.config.schedule_for(project)?;
                if request.current_month {
                    schedule.target_dates_in_month(self.today)
                } else {
                    schedule.target_dates(self.today)
                }
            }
        };

        let existing = self.tracker.list_versions(project)?;

        let version = if request.version.needs_latest() {
            let known = semantic_versions(&existing, &templates);
            log::debug!(
                "Latest version of {}: {}",
                project,
                known.iter().max().map_or("none".to_string(), |v| v.to_string())
            );
            request.version.resolve(&known)?
        } else {
            request.version.resolve(&[])?
        };

        let mut report = CreateReport {
            project: project.to_string(),
            dry_run: self.dry_run,
            ..CreateReport::default()
        };

        let mut names = Vec::new();
        let mut seen = HashSet::new();
        let mut skipped_templates = HashSet::new();
        let mut first_error = None;

        for date in &dates {
            let mut fields = VersionFields::for_date(project, *date);
            if let Some(version) = &version {
                fields = fields.with_version(version);
            }

            for template in templates.iter() {
                match template.render(&fields) {
                    Ok(name) => {
                        if seen.insert(name.clone()) {
                            names.push(name);
                        }
                    }
                    Err(e) => {
                        if skipped_templates.insert(template.id().to_string()) {
                            report.warnings.push(LifecycleWarning::TemplateSkipped {
                                template: template.id().to_string(),
                                reason: e.to_string(),
                            });
                            first_error.get_or_insert(e);
                        }
                    }
                }
            }
        }

        if names.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let existing: HashMap<&str, &str> = existing
            .iter()
            .map(|v| (v.name.as_str(), v.id.as_str()))
            .collect();
        let issue_types = self.config.issue_types_for(project);
        for name in names {
            if let Some(id) = existing.get(name.as_str()) {
                match self.tracker.issues_for_version(id, &issue_types) {
                    Ok(issues) if !issues.is_empty() => {
                        report.skipped_issues.insert(name.clone(), issues);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("Cannot look up issues of {}: {}", name, e),
                }
                report.skipped.push(name);
                continue;
            }
            if self.dry_run {
                report.created.push(name);
                continue;
            }

            match self.tracker.create_version(project, &name) {
                Ok(_) => {
                    log::info!("Created version {} in {}", name, project);
                    report.created.push(name);
                }
                Err(VersionManagerError::DuplicateVersion { .. }) => report.skipped.push(name),
                Err(e) => {
                    log::warn!("Failed to create {} in {}: {}", name, project, e);
                    report.failed.push(ActionFailure::new(name, e));
                }
            }
        }

        Ok(report)
    }

    /// Delete one version by name.
    ///
    /// With `move_to`, its issues are reassigned to that version first.
    /// Without it, a version with issues is only deleted when `force` is set.
    ///
    /// # Returns
    /// * `Err(NotFound)` - The version or the `move_to` target does not exist
    /// * `Err(IssueMigrationRequired)` - Issues attached, no target, not forced
    pub fn delete(
        &self,
        project: &str,
        name: &str,
        move_to: Option<&str>,
        force: bool,
    ) -> Result<DeleteReport> {
        let versions = self.tracker.list_versions(project)?;
        let version = find_by_name(&versions, project, name)?;

        let target = match move_to {
            Some(target_name) => {
                let target = find_by_name(&versions, project, target_name)?;
                if target.id == version.id {
                    return Err(VersionManagerError::invalid_input(format!(
                        "cannot move issues of '{}' to itself",
                        name
                    )));
                }
                Some(target)
            }
            None => None,
        };

        let issue_count = self.tracker.issues_for_version(&version.id, &[])?.len();

        let disposition = match target {
            Some(target) => IssueDisposition::MoveTo(target.id.clone()),
            None if issue_count > 0 && !force => {
                return Err(VersionManagerError::IssueMigrationRequired {
                    version: name.to_string(),
                    count: issue_count,
                });
            }
            None if force => IssueDisposition::Detach,
            None => IssueDisposition::Refuse,
        };

        if !self.dry_run {
            self.tracker.delete_version(&version.id, &disposition)?;
            log::info!("Deleted version {} from {}", name, project);
        }

        Ok(DeleteReport {
            project: project.to_string(),
            dry_run: self.dry_run,
            name: name.to_string(),
            issue_count,
            moved_to: move_to.map(str::to_string),
        })
    }

    /// Delete old versions that have no issues.
    ///
    /// Only names recognised by the project's templates carry a date, so
    /// every other version is left alone. Issue counts are looked up only for
    /// versions that pass the age and release checks.
    pub fn cleanup(&self, project: &str, settings: &CleanupSettings) -> Result<CleanupReport> {
        let templates = self.project_templates(project)?;
        let versions = self.tracker.list_versions(project)?;

        let mut report = CleanupReport {
            project: project.to_string(),
            dry_run: self.dry_run,
            scanned: versions.len(),
            ..CleanupReport::default()
        };

        for mut record in versions {
            let found = templates.scan(&record.name);
            if let Some(found) = &found {
                note_non_canonical(&mut report.warnings, &record.name, found);
            }
            let version_date = found.and_then(|m| m.fields.date());

            let mut probe = record.clone();
            probe.issue_count = Some(0);
            if !is_due_for_cleanup(&probe, version_date, self.today, settings) {
                continue;
            }

            match self.tracker.issues_for_version(&record.id, &[]) {
                Ok(issues) => record.issue_count = Some(issues.len()),
                Err(e) => {
                    report.failed.push(ActionFailure::new(&record.name, e));
                    continue;
                }
            }

            if !is_due_for_cleanup(&record, version_date, self.today, settings) {
                report.warnings.push(LifecycleWarning::VersionInUse {
                    name: record.name.clone(),
                    issues: record.issue_count.unwrap_or_default(),
                });
                continue;
            }

            if self.dry_run {
                report.deleted.push(record.name);
                continue;
            }

            match self
                .tracker
                .delete_version(&record.id, &IssueDisposition::Refuse)
            {
                Ok(()) => {
                    log::info!("Cleaned up version {} from {}", record.name, project);
                    report.deleted.push(record.name);
                }
                Err(e) => report.failed.push(ActionFailure::new(record.name, e)),
            }
        }

        Ok(report)
    }

    /// Mark old released versions as archived.
    ///
    /// The description gets the `[ARCHIVED]` prefix unless it already has it,
    /// and the archived flag is set.
    pub fn archive(&self, project: &str) -> Result<ArchiveReport> {
        let settings = self.config.archive_settings_for(project);
        let mut report = ArchiveReport {
            project: project.to_string(),
            dry_run: self.dry_run,
            ..ArchiveReport::default()
        };

        if !settings.enabled {
            report.warnings.push(LifecycleWarning::ArchiveDisabled {
                project: project.to_string(),
            });
            return Ok(report);
        }

        let templates = self.project_templates(project)?;
        let versions = self.tracker.list_versions(project)?;
        report.scanned = versions.len();

        for record in versions {
            let parsed_date = templates
                .scan(&record.name)
                .and_then(|found| found.fields.date());
            if !is_due_for_archive(&record, parsed_date, self.today, &settings) {
                continue;
            }

            let update = VersionUpdate {
                description: (!record.is_marked_archived()).then(|| record.archived_description()),
                archived: Some(true),
                released: None,
            };

            if self.dry_run {
                report.archived.push(record.name);
                continue;
            }

            match self.tracker.update_version(&record.id, &update) {
                Ok(_) => {
                    log::info!("Archived version {} in {}", record.name, project);
                    report.archived.push(record.name);
                }
                Err(e) => report.failed.push(ActionFailure::new(record.name, e)),
            }
        }

        Ok(report)
    }

    /// List a project's versions, optionally with their issues.
    ///
    /// Issues are restricted to the project's configured issue types.
    pub fn list(&self, project: &str, filter: ReleaseFilter, with_issues: bool) -> Result<ListReport> {
        let templates = self.project_templates(project)?;
        let issue_types = self.config.issue_types_for(project);

        let mut report = ListReport {
            project: project.to_string(),
            ..ListReport::default()
        };

        for mut record in self.tracker.list_versions(project)? {
            if !filter.accepts(&record) {
                continue;
            }

            let found = templates.scan(&record.name);
            if let Some(found) = &found {
                note_non_canonical(&mut report.warnings, &record.name, found);
            }

            let issues = if with_issues {
                let issues = self.tracker.issues_for_version(&record.id, &issue_types)?;
                record.issue_count = Some(issues.len());
                Some(issues)
            } else {
                None
            };

            report.versions.push(ListedVersion {
                record,
                template: found.map(|m| m.template_id),
                issues,
            });
        }

        Ok(report)
    }
}

fn find_by_name<'v>(
    versions: &'v [VersionRecord],
    project: &str,
    name: &str,
) -> Result<&'v VersionRecord> {
    versions.iter().find(|v| v.name == name).ok_or_else(|| {
        VersionManagerError::not_found(format!("version '{}' in project {}", name, project))
    })
}

fn note_non_canonical(warnings: &mut Vec<LifecycleWarning>, name: &str, found: &ScanMatch) {
    if let (true, Some(expected)) = (found.needs_fix(name), &found.canonical) {
        warnings.push(LifecycleWarning::NonCanonicalName {
            name: name.to_string(),
            template: found.template_id.clone(),
            expected: expected.clone(),
        });
    }
}

/// Semantic versions of `versions`, recovered through `templates` or, failing
/// that, from a bare version string such as `v1.2.3-alpha.2`.
pub fn semantic_versions(versions: &[VersionRecord], templates: &TemplateSet) -> Vec<SemanticVersion> {
    versions
        .iter()
        .filter_map(|record| {
            templates
                .scan(&record.name)
                .and_then(|found| found.fields.semantic_version())
                .or_else(|| SemanticVersion::parse(&record.name).ok())
        })
        .collect()
}

/// Highest of [semantic_versions].
pub fn latest_version(versions: &[VersionRecord], templates: &TemplateSet) -> Option<SemanticVersion> {
    semantic_versions(versions, templates).into_iter().max()
}
