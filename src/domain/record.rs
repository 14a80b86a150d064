use chrono::NaiveDate;
use serde::Serialize;

/// Prefix marking a version description as archived.
pub const ARCHIVED_PREFIX: &str = "[ARCHIVED]";

/// A version as reported by the issue tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    pub id: String,
    pub name: String,
    pub project: String,
    pub released: bool,
    pub archived: bool,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    /// Issues assigned to the version, when it has been looked up
    pub issue_count: Option<usize>,
}

impl VersionRecord {
    /// A fresh, unreleased version with no description.
    pub fn new(id: impl Into<String>, project: impl Into<String>, name: impl Into<String>) -> Self {
        VersionRecord {
            id: id.into(),
            name: name.into(),
            project: project.into(),
            released: false,
            archived: false,
            description: String::new(),
            release_date: None,
            issue_count: None,
        }
    }

    pub fn is_marked_archived(&self) -> bool {
        self.description.starts_with(ARCHIVED_PREFIX)
    }

    /// Description with the archive prefix, unchanged if already present.
    pub fn archived_description(&self) -> String {
        if self.is_marked_archived() {
            self.description.clone()
        } else if self.description.is_empty() {
            ARCHIVED_PREFIX.to_string()
        } else {
            format!("{} {}", ARCHIVED_PREFIX, self.description)
        }
    }
}

/// Fields to change on an existing version; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<bool>,
}

/// An issue assigned to a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueSummary {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub issue_type: String,
}

/// What to do with a version's issues when the version is deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueDisposition {
    /// Fail with `IssuesAttached` if any issue is assigned
    Refuse,
    /// Reassign every issue to the version with this id first
    MoveTo(String),
    /// Delete anyway; issues lose the version
    Detach,
}

/// Which versions `list` shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseFilter {
    #[default]
    All,
    Released,
    Unreleased,
}

impl ReleaseFilter {
    pub fn accepts(self, record: &VersionRecord) -> bool {
        match self {
            ReleaseFilter::All => true,
            ReleaseFilter::Released => record.released,
            ReleaseFilter::Unreleased => !record.released,
        }
    }
}
