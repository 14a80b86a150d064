// tests/config_test.rs
use jira_version_manager::config::{load_config, load_config_file, Config};
use jira_version_manager::domain::schedule::ArchiveSettings;
use jira_version_manager::error::VersionManagerError;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_VARS: [&str; 6] = [
    "JIRA_BASE_URL",
    "JIRA_API_TOKEN",
    "JIRA_EMAIL",
    "JIRA_PROJECT_KEYS",
    "JIRA_DEFAULT_TEMPLATES",
    "JIRA_VERIFY_SSL",
];

fn clear_env() {
    for name in ENV_VARS {
        std::env::remove_var(name);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_default_config() {
    let config = Config::default();
    assert_eq!(config.project_keys, vec!["PROJECT1", "PROJECT2"]);
    assert_eq!(
        config.templates.get("standard"),
        Some(&"{PROJECT}.W{WEEK}.{YEAR}.{MONTH}.{DAY}".to_string())
    );
    assert!(config.templates.contains_key("semver"));
    assert_eq!(config.jira.timeout_secs, 30);
    assert_eq!(config.jira.max_retries, 3);
    assert!(config.jira.verify_ssl);
    assert_eq!(config.cleanup.min_age_days, 7);
    assert!(!config.cleanup.include_released);
}

#[test]
fn test_load_from_fixture() {
    let config = load_config_file(Some("tests/fixtures/config_full.toml")).unwrap();

    assert_eq!(config.project_keys, vec!["APP", "OPS"]);
    assert_eq!(config.jira.api_token, "file-token");
    assert_eq!(config.jira.max_retries, 2);
    assert_eq!(config.templates_for("APP"), vec!["standard", "intake"]);
    assert_eq!(config.templates_for("OPS"), vec!["semver"]);
    assert_eq!(config.issue_types_for("APP"), vec!["Epic", "Story"]);
    assert_eq!(config.issue_types_for("OPS"), vec!["Epic"]);

    let schedule = config.schedule_for("APP").unwrap();
    assert_eq!(schedule.frequency(), 2);
    assert_eq!(schedule.days().len(), 2);

    assert_eq!(
        config.archive_settings_for("OPS"),
        ArchiveSettings {
            months: 6,
            enabled: false
        }
    );
    assert_eq!(config.archive_settings_for("APP"), ArchiveSettings::default());
    assert_eq!(config.cleanup.min_age_days, 14);
    assert!(config.cleanup.include_released);

    let registry = config.validate().unwrap();
    assert!(registry.get("intake").is_some());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let temp_file = write_config(
        r#"
project_keys = ["WEB"]

[jira]
base_url = "https://jira.internal"
"#,
    );

    let config = load_config_file(Some(temp_file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.project_keys, vec!["WEB"]);
    assert_eq!(config.jira.base_url, "https://jira.internal");
    assert_eq!(config.jira.timeout_secs, 30);
    assert!(config.templates.contains_key("standard"));
    assert_eq!(config.templates_for("WEB"), vec!["standard"]);
}

#[test]
fn test_missing_config_file_is_error() {
    let err = load_config_file(Some("tests/fixtures/does_not_exist.toml")).unwrap_err();
    assert!(matches!(err, VersionManagerError::Config(_)));
}

#[test]
fn test_invalid_toml_is_error() {
    let temp_file = write_config("project_keys = [\"APP\"");
    let err = load_config_file(Some(temp_file.path().to_str().unwrap())).unwrap_err();
    assert!(matches!(err, VersionManagerError::Toml(_)));
}

#[test]
#[serial]
fn test_malformed_template_fails_validation() {
    clear_env();
    let temp_file = write_config(
        r#"
[templates]
standard = "{PROJECT}.W{WEEK:x}"
"#,
    );

    let err = load_config(Some(temp_file.path().to_str().unwrap())).unwrap_err();
    assert!(matches!(err, VersionManagerError::Config(_)));
}

#[test]
#[serial]
fn test_missing_standard_template_fails_validation() {
    clear_env();
    let temp_file = write_config(
        r#"
default_templates = ["nightly"]

[templates]
nightly = "{PROJECT}.N{YEAR}{MONTH}{DAY}"
"#,
    );

    let err = load_config(Some(temp_file.path().to_str().unwrap())).unwrap_err();
    assert!(err.to_string().contains("standard"));
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    std::env::set_var("JIRA_API_TOKEN", "env-token");
    std::env::set_var("JIRA_PROJECT_KEYS", "ENV1,ENV2");
    std::env::set_var("JIRA_VERIFY_SSL", "no");

    let result = load_config(Some("tests/fixtures/config_full.toml"));
    clear_env();

    let (config, _registry) = result.unwrap();
    assert_eq!(config.jira.api_token, "env-token");
    assert_eq!(config.jira.base_url, "https://jira.example.com");
    assert_eq!(config.project_keys, vec!["ENV1", "ENV2"]);
    assert!(!config.jira.verify_ssl);
}

#[test]
#[serial]
fn test_environment_default_templates_are_validated() {
    clear_env();
    std::env::set_var("JIRA_DEFAULT_TEMPLATES", "standard,unknown");

    let result = load_config(Some("tests/fixtures/config_full.toml"));
    clear_env();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("unknown"));
}
