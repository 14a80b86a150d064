//! Issue tracker abstraction layer
//!
//! The lifecycle operations talk to the tracker only through the
//! [VersionRepository] trait. Two implementations exist:
//!
//! - [jira::JiraClient]: the Jira REST API over blocking HTTP
//! - [mock::MockTracker]: an in-memory tracker for tests and dry runs
//!
//! ```rust
//! # use jira_version_manager::tracker::VersionRepository;
//! # fn example<R: VersionRepository>(tracker: &R) -> jira_version_manager::error::Result<()> {
//! for version in tracker.list_versions("PROJECT1")? {
//!     println!("{} ({})", version.name, version.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod jira;
pub mod mock;

pub use crate::domain::record::{
    IssueDisposition, IssueSummary, VersionRecord, VersionUpdate,
};
pub use jira::JiraClient;
pub use mock::{MockTracker, TrackerCall};

use crate::error::Result;

/// Version operations the lifecycle needs from an issue tracker
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync`.
///
/// ## Error Handling
///
/// Implementations map their failures onto [crate::error::VersionManagerError]:
/// unreachable tracker as `Transport`, rejected requests as `Api`, a name
/// collision as `DuplicateVersion`, and a missing project or version as
/// `NotFound`.
pub trait VersionRepository: Send + Sync {
    /// List every version of a project, in tracker order.
    ///
    /// # Returns
    /// * `Ok(Vec<VersionRecord>)` - Versions without issue counts
    /// * `Err(NotFound)` - If the project does not exist
    fn list_versions(&self, project: &str) -> Result<Vec<VersionRecord>>;

    /// Create an unreleased version named `name`.
    ///
    /// # Returns
    /// * `Ok(VersionRecord)` - The created version with its tracker id
    /// * `Err(DuplicateVersion)` - If the project already has that name
    fn create_version(&self, project: &str, name: &str) -> Result<VersionRecord>;

    /// Delete a version, handling its issues per `disposition`.
    ///
    /// # Returns
    /// * `Err(IssuesAttached)` - With [IssueDisposition::Refuse] and issues present
    /// * `Err(NotFound)` - If the version or the move target does not exist
    fn delete_version(&self, version_id: &str, disposition: &IssueDisposition) -> Result<()>;

    /// Apply `update` to a version and return the result.
    fn update_version(&self, version_id: &str, update: &VersionUpdate) -> Result<VersionRecord>;

    /// Issues whose fix version is `version_id`, restricted to `issue_types`
    /// unless that list is empty.
    fn issues_for_version(
        &self,
        version_id: &str,
        issue_types: &[String],
    ) -> Result<Vec<IssueSummary>>;
}

impl<R: VersionRepository + ?Sized> VersionRepository for &R {
    fn list_versions(&self, project: &str) -> Result<Vec<VersionRecord>> {
        (**self).list_versions(project)
    }

    fn create_version(&self, project: &str, name: &str) -> Result<VersionRecord> {
        (**self).create_version(project, name)
    }

    fn delete_version(&self, version_id: &str, disposition: &IssueDisposition) -> Result<()> {
        (**self).delete_version(version_id, disposition)
    }

    fn update_version(&self, version_id: &str, update: &VersionUpdate) -> Result<VersionRecord> {
        (**self).update_version(version_id, update)
    }

    fn issues_for_version(
        &self,
        version_id: &str,
        issue_types: &[String],
    ) -> Result<Vec<IssueSummary>> {
        (**self).issues_for_version(version_id, issue_types)
    }
}
