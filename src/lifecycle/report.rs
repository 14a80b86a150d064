//! Outcomes of lifecycle operations, one report per project and command

use crate::domain::record::{IssueSummary, VersionRecord};
use crate::warning::LifecycleWarning;
use std::collections::BTreeMap;

/// A single action that failed while its siblings continued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub name: String,
    pub error: String,
}

impl ActionFailure {
    pub fn new(name: impl Into<String>, error: impl ToString) -> Self {
        ActionFailure {
            name: name.into(),
            error: error.to_string(),
        }
    }
}

/// Result of `create` for one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReport {
    pub project: String,
    pub dry_run: bool,
    /// Created, or to be created in a dry run
    pub created: Vec<String>,
    /// Already present in the tracker
    pub skipped: Vec<String>,
    /// Issues of the configured types on skipped versions, by name
    pub skipped_issues: BTreeMap<String, Vec<IssueSummary>>,
    pub failed: Vec<ActionFailure>,
    pub warnings: Vec<LifecycleWarning>,
}

/// Result of `delete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub project: String,
    pub dry_run: bool,
    pub name: String,
    /// Issues that were assigned to the version
    pub issue_count: usize,
    /// Version the issues were moved to
    pub moved_to: Option<String>,
}

/// Result of `cleanup` for one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub project: String,
    pub dry_run: bool,
    /// Deleted, or to be deleted in a dry run
    pub deleted: Vec<String>,
    /// Versions examined
    pub scanned: usize,
    pub failed: Vec<ActionFailure>,
    pub warnings: Vec<LifecycleWarning>,
}

/// Result of `archive` for one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub project: String,
    pub dry_run: bool,
    /// Archived, or to be archived in a dry run
    pub archived: Vec<String>,
    pub scanned: usize,
    pub failed: Vec<ActionFailure>,
    pub warnings: Vec<LifecycleWarning>,
}

/// A version as shown by `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedVersion {
    pub record: VersionRecord,
    /// Template the name was generated from, if recognised
    pub template: Option<String>,
    /// Assigned issues of the configured types, when requested
    pub issues: Option<Vec<IssueSummary>>,
}

/// Result of `list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListReport {
    pub project: String,
    pub versions: Vec<ListedVersion>,
    pub warnings: Vec<LifecycleWarning>,
}

impl CreateReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl CleanupReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl ArchiveReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
