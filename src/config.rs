use crate::domain::schedule::{ArchiveSettings, CleanupSettings, ReleaseSchedule};
use crate::domain::template::{TemplateRegistry, STANDARD_TEMPLATE};
use crate::error::{Result, VersionManagerError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the user config directory.
pub const CONFIG_FILE_NAME: &str = "jira-version-manager.toml";

/// Represents the complete configuration for jira-version-manager.
///
/// Contains the Jira connection, the version name templates and the
/// per-project scheduling, archive and issue type settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub jira: JiraSettings,

    #[serde(default = "default_project_keys")]
    pub project_keys: Vec<String>,

    /// Templates used by projects without an entry in `project_templates`
    #[serde(default = "default_template_ids")]
    pub default_templates: Vec<String>,

    #[serde(default = "default_templates")]
    pub templates: BTreeMap<String, String>,

    #[serde(default)]
    pub project_templates: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub issue_types: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub release_schedule: HashMap<String, ScheduleConfig>,

    #[serde(default)]
    pub archive: HashMap<String, ArchiveSettings>,

    #[serde(default)]
    pub cleanup: CleanupSettings,
}

fn default_base_url() -> String {
    "https://your-jira-instance.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Connection settings for the Jira REST API.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct JiraSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_token: String,

    /// Jira Cloud account email; switches authentication to Basic
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for JiraSettings {
    fn default() -> Self {
        JiraSettings {
            base_url: default_base_url(),
            api_token: String::new(),
            email: None,
            verify_ssl: true,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_release_days() -> Vec<u8> {
    vec![0, 1, 2, 3]
}

fn default_frequency() -> u32 {
    1
}

/// Release days (0 = Monday .. 6 = Sunday) and week cadence for one project.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    #[serde(default = "default_release_days")]
    pub days: Vec<u8>,

    #[serde(default = "default_frequency")]
    pub frequency: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            days: default_release_days(),
            frequency: default_frequency(),
        }
    }
}

/// Returns the default project keys.
fn default_project_keys() -> Vec<String> {
    vec!["PROJECT1".to_string(), "PROJECT2".to_string()]
}

fn default_template_ids() -> Vec<String> {
    vec![STANDARD_TEMPLATE.to_string()]
}

/// Returns the built-in version name templates.
fn default_templates() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(
        STANDARD_TEMPLATE.to_string(),
        "{PROJECT}.W{WEEK}.{YEAR}.{MONTH}.{DAY}".to_string(),
    );
    map.insert(
        "intake".to_string(),
        "{PROJECT}.INTAKE.W{WEEK}.{YEAR}.{MONTH}.{DAY}".to_string(),
    );
    map.insert(
        "release".to_string(),
        "{PROJECT}.RELEASE.{YEAR}.{MONTH}.{DAY}".to_string(),
    );
    map.insert(
        "semver".to_string(),
        "{PROJECT}.v{MAJOR}.{MINOR}.{PATCH}{PRE_RELEASE}{BUILD}".to_string(),
    );
    map
}

fn default_issue_types() -> Vec<String> {
    vec!["Epic".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            jira: JiraSettings::default(),
            project_keys: default_project_keys(),
            default_templates: default_template_ids(),
            templates: default_templates(),
            project_templates: HashMap::new(),
            issue_types: HashMap::new(),
            release_schedule: HashMap::new(),
            archive: HashMap::new(),
            cleanup: CleanupSettings::default(),
        }
    }
}

impl Config {
    /// Template ids for `project`: its own list, else the global default,
    /// else `standard`.
    pub fn templates_for(&self, project: &str) -> Vec<String> {
        match self.project_templates.get(project) {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ if !self.default_templates.is_empty() => self.default_templates.clone(),
            _ => default_template_ids(),
        }
    }

    /// Issue types counted when listing a project's versions.
    pub fn issue_types_for(&self, project: &str) -> Vec<String> {
        self.issue_types
            .get(project)
            .cloned()
            .unwrap_or_else(default_issue_types)
    }

    pub fn schedule_for(&self, project: &str) -> Result<ReleaseSchedule> {
        match self.release_schedule.get(project) {
            Some(schedule) => ReleaseSchedule::new(&schedule.days, schedule.frequency)
                .map_err(|e| VersionManagerError::config(format!("project {}: {}", project, e))),
            None => Ok(ReleaseSchedule::default()),
        }
    }

    pub fn archive_settings_for(&self, project: &str) -> ArchiveSettings {
        self.archive.get(project).copied().unwrap_or_default()
    }

    /// Compile every configured template.
    pub fn template_registry(&self) -> Result<TemplateRegistry> {
        TemplateRegistry::compile(&self.templates)
    }

    /// Check the whole configuration before any tracker call is made.
    ///
    /// # Returns
    /// * `Ok(TemplateRegistry)` - The compiled templates
    /// * `Err` - The first problem found
    pub fn validate(&self) -> Result<TemplateRegistry> {
        if !self.jira.base_url.starts_with("http://") && !self.jira.base_url.starts_with("https://")
        {
            return Err(VersionManagerError::config(
                "Invalid Jira base URL. Must start with http:// or https://",
            ));
        }

        let registry = self.template_registry()?;

        registry.select(&self.default_templates)?;
        for (project, ids) in &self.project_templates {
            registry.select(ids).map_err(|e| {
                VersionManagerError::config(format!("project {}: {}", project, e))
            })?;
        }
        for project in self.release_schedule.keys() {
            self.schedule_for(project)?;
        }

        Ok(registry)
    }

    /// Apply environment overrides.
    ///
    /// `lookup` resolves a variable name; pass `|name| std::env::var(name).ok()`
    /// for the real environment. Recognised: `JIRA_BASE_URL`, `JIRA_API_TOKEN`,
    /// `JIRA_EMAIL`, `JIRA_PROJECT_KEYS`, `JIRA_DEFAULT_TEMPLATES`,
    /// `JIRA_VERIFY_SSL`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("JIRA_BASE_URL") {
            self.jira.base_url = url;
        }
        if let Some(token) = lookup("JIRA_API_TOKEN") {
            self.jira.api_token = token;
        }
        if let Some(email) = lookup("JIRA_EMAIL") {
            self.jira.email = Some(email);
        }
        if let Some(keys) = lookup("JIRA_PROJECT_KEYS") {
            self.project_keys = split_list(&keys);
        }
        if let Some(ids) = lookup("JIRA_DEFAULT_TEMPLATES") {
            self.default_templates = split_list(&ids);
        }
        if let Some(verify) = lookup("JIRA_VERIFY_SSL") {
            self.jira.verify_ssl = !matches!(
                verify.trim().to_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            );
        }
    }

    /// Configuration as TOML with the API token masked.
    pub fn to_masked_toml(&self) -> Result<String> {
        let mut masked = self.clone();
        if !masked.jira.api_token.is_empty() {
            masked.jira.api_token = "***".to_string();
        }
        toml::to_string_pretty(&masked)
            .map_err(|e| VersionManagerError::config(format!("cannot display configuration: {}", e)))
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Locates the configuration file, if any.
///
/// Lookup order:
/// 1. Custom path provided as parameter
/// 2. `jira-version-manager.toml` in current directory
/// 3. `jira-version-manager.toml` in the user config directory
pub fn find_config_file(config_path: Option<&str>) -> Result<Option<PathBuf>> {
    if let Some(path) = config_path {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(VersionManagerError::config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    let local = Path::new(".").join(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    Ok(dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists()))
}

/// Loads configuration from file or returns defaults, without environment
/// overrides or validation.
pub fn load_config_file(config_path: Option<&str>) -> Result<Config> {
    match find_config_file(config_path)? {
        Some(path) => {
            log::debug!("Loading configuration from {}", path.display());
            let config_str = fs::read_to_string(&path)?;
            Ok(toml::from_str(&config_str)?)
        }
        None => {
            log::debug!("No configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Loads the resolved configuration: file (or defaults), then environment
/// overrides, then validation.
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok((Config, TemplateRegistry))` - Resolved configuration and its compiled templates
/// * `Err` - If the file cannot be read or parsed, or the result is invalid
pub fn load_config(config_path: Option<&str>) -> Result<(Config, TemplateRegistry)> {
    let mut config = load_config_file(config_path)?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    let registry = config.validate()?;
    Ok((config, registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        let registry = config.validate().unwrap();
        assert!(registry.get("standard").is_some());
    }

    #[test]
    fn test_templates_for_fallbacks() {
        let mut config = Config::default();
        config
            .project_templates
            .insert("PROJECT1".to_string(), vec!["standard".to_string(), "release".to_string()]);

        assert_eq!(config.templates_for("PROJECT1"), vec!["standard", "release"]);
        assert_eq!(config.templates_for("PROJECT3"), vec!["standard"]);

        config.default_templates = vec!["intake".to_string()];
        assert_eq!(config.templates_for("PROJECT3"), vec!["intake"]);

        config.default_templates.clear();
        assert_eq!(config.templates_for("PROJECT3"), vec!["standard"]);
    }

    #[test]
    fn test_issue_types_default_to_epic() {
        let config = Config::default();
        assert_eq!(config.issue_types_for("PROJECT1"), vec!["Epic"]);
    }

    #[test]
    fn test_schedule_and_archive_defaults() {
        let config = Config::default();
        assert_eq!(config.schedule_for("PROJECT1").unwrap(), ReleaseSchedule::default());
        assert_eq!(config.archive_settings_for("PROJECT1"), ArchiveSettings::default());
    }

    #[test]
    fn test_validate_missing_standard() {
        let mut config = Config::default();
        config.templates.remove("standard");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, VersionManagerError::Config(_)));
    }

    #[test]
    fn test_validate_unknown_project_template() {
        let mut config = Config::default();
        config
            .project_templates
            .insert("PROJECT1".to_string(), vec!["nightly".to_string()]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nightly"));
    }

    #[test]
    fn test_validate_bad_schedule() {
        let mut config = Config::default();
        config.release_schedule.insert(
            "PROJECT1".to_string(),
            ScheduleConfig {
                days: vec![],
                frequency: 1,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = Config::default();
        config.jira.base_url = "jira.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("JIRA_BASE_URL", "https://jira.example.com"),
            ("JIRA_API_TOKEN", "test-token"),
            ("JIRA_PROJECT_KEYS", "TEST1, TEST2"),
            ("JIRA_DEFAULT_TEMPLATES", "standard,intake"),
            ("JIRA_VERIFY_SSL", "false"),
        ]));

        assert_eq!(config.jira.base_url, "https://jira.example.com");
        assert_eq!(config.jira.api_token, "test-token");
        assert_eq!(config.project_keys, vec!["TEST1", "TEST2"]);
        assert_eq!(config.default_templates, vec!["standard", "intake"]);
        assert!(!config.jira.verify_ssl);
    }

    #[test]
    fn test_env_overrides_ignore_empty_values() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("JIRA_PROJECT_KEYS", "  ")]));
        assert_eq!(config.project_keys, default_project_keys());
    }

    #[test]
    fn test_masked_toml_hides_token() {
        let mut config = Config::default();
        config.jira.api_token = "secret-token".to_string();
        let shown = config.to_masked_toml().unwrap();
        assert!(!shown.contains("secret-token"));
        assert!(shown.contains("***"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(find_config_file(Some("/nonexistent/jira-version-manager.toml")).is_err());
    }
}
