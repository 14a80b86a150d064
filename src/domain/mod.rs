//! Domain logic - pure business rules independent of the issue tracker

pub mod calendar;
pub mod prerelease;
pub mod record;
pub mod schedule;
pub mod template;
pub mod version;

pub use prerelease::PreRelease;
pub use record::{IssueDisposition, IssueSummary, ReleaseFilter, VersionRecord, VersionUpdate};
pub use schedule::{ArchiveSettings, CleanupSettings, ReleaseSchedule};
pub use template::{
    Placeholder, ScanMatch, TemplateRegistry, TemplateSet, VersionFields, VersionTemplate,
};
pub use version::{SemanticVersion, VersionBump, VersionSpec};
