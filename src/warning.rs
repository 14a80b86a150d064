use std::fmt;

/// Non-fatal findings reported alongside a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleWarning {
    /// Name matched a template but differs from that template's rendering
    NonCanonicalName {
        name: String,
        template: String,
        expected: String,
    },
    /// Archiving is switched off for the project
    ArchiveDisabled { project: String },
    /// Version old enough for cleanup but still has issues assigned
    VersionInUse { name: String, issues: usize },
    /// Template skipped because it needs values the invocation did not provide
    TemplateSkipped { template: String, reason: String },
}

impl fmt::Display for LifecycleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleWarning::NonCanonicalName {
                name,
                template,
                expected,
            } => write!(
                f,
                "Version '{}' looks like template '{}' but should be named '{}'",
                name, template, expected
            ),
            LifecycleWarning::ArchiveDisabled { project } => {
                write!(f, "Archiving is disabled for project {}", project)
            }
            LifecycleWarning::VersionInUse { name, issues } => write!(
                f,
                "Version '{}' is old enough to clean up but has {} issue(s)",
                name, issues
            ),
            LifecycleWarning::TemplateSkipped { template, reason } => {
                write!(f, "Template '{}' skipped: {}", template, reason)
            }
        }
    }
}
