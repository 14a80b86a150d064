use crate::error::{Result, VersionManagerError};
use crate::tracker::{
    IssueDisposition, IssueSummary, VersionRecord, VersionRepository, VersionUpdate,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// A request received by [MockTracker]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    ListVersions { project: String },
    CreateVersion { project: String, name: String },
    DeleteVersion { version_id: String, disposition: IssueDisposition },
    UpdateVersion { version_id: String, update: VersionUpdate },
    IssuesForVersion { version_id: String },
}

impl TrackerCall {
    /// Whether the call changes tracker state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            TrackerCall::CreateVersion { .. }
                | TrackerCall::DeleteVersion { .. }
                | TrackerCall::UpdateVersion { .. }
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    versions: Vec<VersionRecord>,
    issues: HashMap<String, Vec<IssueSummary>>,
    unreachable: HashSet<String>,
    next_id: u64,
    calls: Vec<TrackerCall>,
}

impl MockState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{}", 10_000 + self.next_id)
    }

    fn position(&self, version_id: &str) -> Result<usize> {
        self.versions
            .iter()
            .position(|v| v.id == version_id)
            .ok_or_else(|| VersionManagerError::not_found(format!("version id {}", version_id)))
    }
}

/// In-memory tracker for tests, recording every call it receives
///
/// Any project key is accepted and starts with no versions. Projects marked
/// with [MockTracker::fail_project] answer every listing with a transport
/// error.
#[derive(Debug, Default)]
pub struct MockTracker {
    state: Mutex<MockState>,
}

impl MockTracker {
    /// Create a new empty mock tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an unreleased version and return its id
    pub fn add_version(&self, project: &str, name: &str) -> String {
        let mut state = self.state();
        let id = state.allocate_id();
        state.versions.push(VersionRecord::new(id.clone(), project, name));
        id
    }

    /// Add a fully specified version; an empty id is replaced by a fresh one
    pub fn insert_version(&self, mut record: VersionRecord) -> String {
        let mut state = self.state();
        if record.id.is_empty() {
            record.id = state.allocate_id();
        }
        let id = record.id.clone();
        state.versions.push(record);
        id
    }

    /// Builder form of [add_version](Self::add_version)
    pub fn with_version(self, project: &str, name: &str) -> Self {
        self.add_version(project, name);
        self
    }

    /// Assign an issue to a version
    pub fn add_issue(&self, version_id: &str, key: &str, issue_type: &str) {
        self.state()
            .issues
            .entry(version_id.to_string())
            .or_default()
            .push(IssueSummary {
                key: key.to_string(),
                summary: format!("Summary of {}", key),
                status: "Open".to_string(),
                issue_type: issue_type.to_string(),
            });
    }

    /// Make every listing of `project` fail with a transport error
    pub fn fail_project(&self, project: &str) {
        self.state().unreachable.insert(project.to_string());
    }

    /// Every call received so far, oldest first
    pub fn calls(&self) -> Vec<TrackerCall> {
        self.state().calls.clone()
    }

    /// Calls that changed tracker state
    pub fn writes(&self) -> Vec<TrackerCall> {
        self.calls().into_iter().filter(TrackerCall::is_write).collect()
    }

    /// Current versions of `project`
    pub fn versions(&self, project: &str) -> Vec<VersionRecord> {
        self.state()
            .versions
            .iter()
            .filter(|v| v.project == project)
            .cloned()
            .collect()
    }

    /// Issue keys currently assigned to `version_id`
    pub fn issue_keys(&self, version_id: &str) -> Vec<String> {
        self.state()
            .issues
            .get(version_id)
            .map(|issues| issues.iter().map(|i| i.key.clone()).collect())
            .unwrap_or_default()
    }
}

impl VersionRepository for MockTracker {
    fn list_versions(&self, project: &str) -> Result<Vec<VersionRecord>> {
        let mut state = self.state();
        state.calls.push(TrackerCall::ListVersions {
            project: project.to_string(),
        });

        if state.unreachable.contains(project) {
            return Err(VersionManagerError::transport(format!(
                "connection refused while listing {}",
                project
            )));
        }

        Ok(state
            .versions
            .iter()
            .filter(|v| v.project == project)
            .cloned()
            .collect())
    }

    fn create_version(&self, project: &str, name: &str) -> Result<VersionRecord> {
        let mut state = self.state();
        state.calls.push(TrackerCall::CreateVersion {
            project: project.to_string(),
            name: name.to_string(),
        });

        if state
            .versions
            .iter()
            .any(|v| v.project == project && v.name == name)
        {
            return Err(VersionManagerError::DuplicateVersion {
                project: project.to_string(),
                name: name.to_string(),
            });
        }

        let id = state.allocate_id();
        let record = VersionRecord::new(id, project, name);
        state.versions.push(record.clone());
        Ok(record)
    }

    fn delete_version(&self, version_id: &str, disposition: &IssueDisposition) -> Result<()> {
        let mut state = self.state();
        state.calls.push(TrackerCall::DeleteVersion {
            version_id: version_id.to_string(),
            disposition: disposition.clone(),
        });

        let index = state.position(version_id)?;
        let attached = state.issues.get(version_id).map_or(0, Vec::len);

        match disposition {
            IssueDisposition::Refuse if attached > 0 => {
                return Err(VersionManagerError::IssuesAttached {
                    version: state.versions[index].name.clone(),
                    count: attached,
                });
            }
            IssueDisposition::MoveTo(target) => {
                state.position(target)?;
                if let Some(moved) = state.issues.remove(version_id) {
                    state.issues.entry(target.clone()).or_default().extend(moved);
                }
            }
            _ => {
                state.issues.remove(version_id);
            }
        }

        state.versions.remove(index);
        Ok(())
    }

    fn update_version(&self, version_id: &str, update: &VersionUpdate) -> Result<VersionRecord> {
        let mut state = self.state();
        state.calls.push(TrackerCall::UpdateVersion {
            version_id: version_id.to_string(),
            update: update.clone(),
        });

        let index = state.position(version_id)?;
        let record = &mut state.versions[index];
        if let Some(description) = &update.description {
            record.description = description.clone();
        }
        if let Some(archived) = update.archived {
            record.archived = archived;
        }
        if let Some(released) = update.released {
            record.released = released;
        }
        Ok(record.clone())
    }

    fn issues_for_version(
        &self,
        version_id: &str,
        issue_types: &[String],
    ) -> Result<Vec<IssueSummary>> {
        let mut state = self.state();
        state.calls.push(TrackerCall::IssuesForVersion {
            version_id: version_id.to_string(),
        });

        state.position(version_id)?;
        Ok(state
            .issues
            .get(version_id)
            .map(|issues| {
                issues
                    .iter()
                    .filter(|issue| {
                        issue_types.is_empty()
                            || issue_types
                                .iter()
                                .any(|t| t.eq_ignore_ascii_case(&issue.issue_type))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_tracker_create_and_list() {
        let tracker = MockTracker::new();
        let created = tracker.create_version("APP", "APP.W01.2024.01.02").unwrap();

        let listed = tracker.list_versions("APP").unwrap();
        assert_eq!(listed, vec![created]);
        assert!(tracker.list_versions("OPS").unwrap().is_empty());
    }

    #[test]
    fn test_mock_tracker_rejects_duplicate() {
        let tracker = MockTracker::new().with_version("APP", "APP.W01.2024.01.02");
        let err = tracker.create_version("APP", "APP.W01.2024.01.02").unwrap_err();
        assert!(matches!(err, VersionManagerError::DuplicateVersion { .. }));

        // same name in another project is fine
        assert!(tracker.create_version("OPS", "APP.W01.2024.01.02").is_ok());
    }

    #[test]
    fn test_mock_tracker_delete_refuses_with_issues() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("APP", "APP.W01.2024.01.02");
        tracker.add_issue(&id, "APP-1", "Epic");

        let err = tracker.delete_version(&id, &IssueDisposition::Refuse).unwrap_err();
        assert!(matches!(err, VersionManagerError::IssuesAttached { count: 1, .. }));
        assert_eq!(tracker.versions("APP").len(), 1);
    }

    #[test]
    fn test_mock_tracker_delete_moves_issues() {
        let tracker = MockTracker::new();
        let from = tracker.add_version("APP", "APP.W01.2024.01.02");
        let to = tracker.add_version("APP", "APP.W01.2024.01.03");
        tracker.add_issue(&from, "APP-1", "Epic");

        tracker
            .delete_version(&from, &IssueDisposition::MoveTo(to.clone()))
            .unwrap();
        assert_eq!(tracker.issue_keys(&to), vec!["APP-1"]);
        assert_eq!(tracker.versions("APP").len(), 1);
    }

    #[test]
    fn test_mock_tracker_delete_missing_target() {
        let tracker = MockTracker::new();
        let from = tracker.add_version("APP", "APP.W01.2024.01.02");
        let err = tracker
            .delete_version(&from, &IssueDisposition::MoveTo("999".to_string()))
            .unwrap_err();
        assert!(matches!(err, VersionManagerError::NotFound(_)));
    }

    #[test]
    fn test_mock_tracker_issue_type_filter() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("APP", "v");
        tracker.add_issue(&id, "APP-1", "Epic");
        tracker.add_issue(&id, "APP-2", "Story");

        assert_eq!(tracker.issues_for_version(&id, &["epic".to_string()]).unwrap().len(), 1);
        assert_eq!(tracker.issues_for_version(&id, &[]).unwrap().len(), 2);
    }

    #[test]
    fn test_mock_tracker_update_and_calls() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("APP", "v");
        let update = VersionUpdate {
            archived: Some(true),
            ..VersionUpdate::default()
        };
        let updated = tracker.update_version(&id, &update).unwrap();
        assert!(updated.archived);
        assert_eq!(tracker.writes().len(), 1);
        assert_eq!(tracker.calls().len(), 1);
    }

    #[test]
    fn test_mock_tracker_unreachable_project() {
        let tracker = MockTracker::new();
        tracker.fail_project("APP");
        let err = tracker.list_versions("APP").unwrap_err();
        assert!(matches!(err, VersionManagerError::Transport(_)));
    }
}
