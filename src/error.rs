use thiserror::Error;

/// Unified error type for jira-version-manager operations
#[derive(Error, Debug)]
pub enum VersionManagerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid version specification: {0}")]
    InvalidVersionSpec(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Jira API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Version '{name}' already exists in project {project}")]
    DuplicateVersion { project: String, name: String },

    #[error("Version '{version}' still has {count} issue(s) attached")]
    IssuesAttached { version: String, count: usize },

    #[error("Version '{version}' has {count} issue(s); pass --move-to <VERSION> or --force")]
    IssueMigrationRequired { version: String, count: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in jira-version-manager
pub type Result<T> = std::result::Result<T, VersionManagerError>;

impl VersionManagerError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        VersionManagerError::Config(msg.into())
    }

    /// Create a version specification error with context
    pub fn version_spec(msg: impl Into<String>) -> Self {
        VersionManagerError::InvalidVersionSpec(msg.into())
    }

    /// Create a template rendering error with context
    pub fn template(msg: impl Into<String>) -> Self {
        VersionManagerError::Template(msg.into())
    }

    /// Create an invalid input error with context
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        VersionManagerError::InvalidInput(msg.into())
    }

    /// Create a transport error with context
    pub fn transport(msg: impl Into<String>) -> Self {
        VersionManagerError::Transport(msg.into())
    }

    /// Create a not-found error with context
    pub fn not_found(msg: impl Into<String>) -> Self {
        VersionManagerError::NotFound(msg.into())
    }

    /// Errors that invalidate the whole invocation rather than a single project.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VersionManagerError::Config(_) | VersionManagerError::InvalidVersionSpec(_)
        )
    }
}
