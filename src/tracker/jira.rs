//! Jira REST API (v2) implementation of [VersionRepository]

use crate::config::JiraSettings;
use crate::domain::calendar::parse_date;
use crate::error::{Result, VersionManagerError};
use crate::tracker::{
    IssueDisposition, IssueSummary, VersionRecord, VersionRepository, VersionUpdate,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const API_PREFIX: &str = "rest/api/2";
const SEARCH_PAGE_SIZE: usize = 100;
const INITIAL_BACKOFF_MS: u64 = 500;

#[derive(Debug, Clone)]
enum Auth {
    Bearer(String),
    Basic { email: String, token: String },
}

/// Blocking Jira client
pub struct JiraClient {
    base_url: String,
    client: Client,
    auth: Auth,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraVersion {
    id: String,
    name: String,
    #[serde(default)]
    released: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    project_id: Option<u64>,
}

impl JiraVersion {
    fn into_record(self, project: Option<&str>) -> VersionRecord {
        let project = project
            .map(str::to_string)
            .or_else(|| self.project_id.map(|id| id.to_string()))
            .unwrap_or_default();

        VersionRecord {
            id: self.id,
            name: self.name,
            project,
            released: self.released,
            archived: self.archived,
            description: self.description.unwrap_or_default(),
            release_date: self.release_date.as_deref().and_then(parse_date),
            issue_count: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<Named>,
    #[serde(default)]
    issuetype: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

impl From<JiraIssue> for IssueSummary {
    fn from(issue: JiraIssue) -> Self {
        IssueSummary {
            key: issue.key,
            summary: issue.fields.summary.unwrap_or_default(),
            status: issue.fields.status.map(|s| s.name).unwrap_or_default(),
            issue_type: issue.fields.issuetype.map(|t| t.name).unwrap_or_default(),
        }
    }
}

impl JiraClient {
    /// Create a client from connection settings.
    ///
    /// Uses Bearer authentication with the API token, or Basic
    /// authentication when an email is configured.
    ///
    /// # Returns
    /// * `Err(Config)` - If no API token is configured
    /// * `Err(Transport)` - If the HTTP client cannot be built
    pub fn new(settings: &JiraSettings) -> Result<Self> {
        if settings.api_token.trim().is_empty() {
            return Err(VersionManagerError::config(
                "Jira API token is not configured (set JIRA_API_TOKEN or [jira].api_token)",
            ));
        }

        let auth = match settings.email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => Auth::Basic {
                email: email.to_string(),
                token: settings.api_token.clone(),
            },
            None => Auth::Bearer(settings.api_token.clone()),
        };

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        if !settings.verify_ssl {
            log::warn!("TLS certificate verification is disabled for {}", settings.base_url);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .build()
            .map_err(|e| VersionManagerError::transport(format!("cannot build HTTP client: {}", e)))?;

        Ok(JiraClient {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
            auth,
            max_retries: settings.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Basic { email, token } => request.basic_auth(email, Some(token)),
        }
    }

    /// Send a request, retrying connection failures, timeouts, rate limits
    /// and server errors with exponential backoff.
    fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let outcome = self.authorize(build(&self.client)).send();
            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status()),
                Err(e) => e.is_connect() || e.is_timeout(),
            };

            if !retryable || attempt >= self.max_retries {
                return outcome.map_err(|e| VersionManagerError::transport(e.to_string()));
            }

            let delay = Duration::from_millis(INITIAL_BACKOFF_MS << attempt.min(6));
            match &outcome {
                Ok(response) => log::warn!(
                    "Jira answered {}, retrying in {:?} ({}/{})",
                    response.status(),
                    delay,
                    attempt + 1,
                    self.max_retries
                ),
                Err(e) => log::warn!(
                    "Jira request failed: {}, retrying in {:?} ({}/{})",
                    e,
                    delay,
                    attempt + 1,
                    self.max_retries
                ),
            }
            std::thread::sleep(delay);
            attempt += 1;
        }
    }

    fn get_version(&self, version_id: &str) -> Result<VersionRecord> {
        let url = self.url(&format!("version/{}", version_id));
        let response = self.send(|client| client.get(&url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(VersionManagerError::not_found(format!("version id {}", version_id)));
        }
        let version: JiraVersion = json(ensure_success(response)?)?;
        Ok(version.into_record(None))
    }

    fn search(&self, jql: &str, start_at: usize, max_results: usize) -> Result<SearchResponse> {
        let url = self.url("search");
        let start_at = start_at.to_string();
        let max_results = max_results.to_string();
        let response = self.send(|client| {
            client.get(&url).query(&[
                ("jql", jql),
                ("startAt", start_at.as_str()),
                ("maxResults", max_results.as_str()),
                ("fields", "summary,status,issuetype"),
            ])
        })?;
        json(ensure_success(response)?)
    }
}

impl VersionRepository for JiraClient {
    fn list_versions(&self, project: &str) -> Result<Vec<VersionRecord>> {
        log::debug!("Listing versions of {}", project);
        let url = self.url(&format!("project/{}/versions", project));
        let response = self.send(|client| client.get(&url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(VersionManagerError::not_found(format!("project {}", project)));
        }

        let versions: Vec<JiraVersion> = json(ensure_success(response)?)?;
        Ok(versions
            .into_iter()
            .map(|v| v.into_record(Some(project)))
            .collect())
    }

    fn create_version(&self, project: &str, name: &str) -> Result<VersionRecord> {
        log::debug!("Creating version {} in {}", name, project);
        let url = self.url("version");
        let payload = serde_json::json!({
            "name": name,
            "project": project,
            "released": false,
        });
        let response = self.send(|client| client.post(&url).json(&payload))?;

        let status = response.status();
        if status.is_success() {
            let version: JiraVersion = json(response)?;
            return Ok(version.into_record(Some(project)));
        }

        let body = response.text().unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.to_lowercase().contains("already exists") {
            return Err(VersionManagerError::DuplicateVersion {
                project: project.to_string(),
                name: name.to_string(),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(VersionManagerError::not_found(format!("project {}", project)));
        }
        Err(api_error(status, &body))
    }

    fn delete_version(&self, version_id: &str, disposition: &IssueDisposition) -> Result<()> {
        if *disposition == IssueDisposition::Refuse {
            let version = self.get_version(version_id)?;
            let count = self.search(&fix_version_jql(version_id, &[]), 0, 0)?.total;
            if count > 0 {
                return Err(VersionManagerError::IssuesAttached {
                    version: version.name,
                    count,
                });
            }
        }

        log::debug!("Deleting version {} ({:?})", version_id, disposition);
        let url = self.url(&format!("version/{}", version_id));
        let response = self.send(|client| {
            let request = client.delete(&url);
            match disposition {
                IssueDisposition::MoveTo(target) => {
                    request.query(&[("moveFixIssuesTo", target.as_str())])
                }
                _ => request,
            }
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(VersionManagerError::not_found(format!("version id {}", version_id)));
        }
        ensure_success(response).map(|_| ())
    }

    fn update_version(&self, version_id: &str, update: &VersionUpdate) -> Result<VersionRecord> {
        log::debug!("Updating version {}", version_id);
        let url = self.url(&format!("version/{}", version_id));
        let response = self.send(|client| client.put(&url).json(update))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(VersionManagerError::not_found(format!("version id {}", version_id)));
        }
        let version: JiraVersion = json(ensure_success(response)?)?;
        Ok(version.into_record(None))
    }

    fn issues_for_version(
        &self,
        version_id: &str,
        issue_types: &[String],
    ) -> Result<Vec<IssueSummary>> {
        let jql = fix_version_jql(version_id, issue_types);
        let mut issues = Vec::new();

        loop {
            let page = self.search(&jql, issues.len(), SEARCH_PAGE_SIZE)?;
            let fetched = page.issues.len();
            issues.extend(page.issues.into_iter().map(IssueSummary::from));
            if fetched == 0 || issues.len() >= page.total {
                break;
            }
        }

        Ok(issues)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn api_error(status: StatusCode, body: &str) -> VersionManagerError {
    VersionManagerError::Api {
        status: status.as_u16(),
        message: error_message(body),
    }
}

/// Extract Jira's `errorMessages`/`errors` from a response body, falling
/// back to the raw text.
fn error_message(body: &str) -> String {
    #[derive(Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    struct ErrorBody {
        #[serde(default)]
        error_messages: Vec<String>,
        #[serde(default)]
        errors: std::collections::BTreeMap<String, String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let mut messages = parsed.error_messages;
    messages.extend(
        parsed
            .errors
            .into_iter()
            .map(|(field, message)| format!("{}: {}", field, message)),
    );

    if messages.is_empty() {
        body.trim().to_string()
    } else {
        messages.join("; ")
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        Err(api_error(status, &body))
    }
}

fn json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .map_err(|e| VersionManagerError::transport(format!("unexpected Jira response: {}", e)))
}

/// JQL selecting the issues fixed in `version_id`, optionally by type.
fn fix_version_jql(version_id: &str, issue_types: &[String]) -> String {
    let mut jql = format!("fixVersion = {}", version_id);
    if !issue_types.is_empty() {
        let types = issue_types
            .iter()
            .map(|t| format!("\"{}\"", t.replace('\\', "\\\\").replace('"', "\\\"")))
            .collect::<Vec<_>>()
            .join(", ");
        jql.push_str(&format!(" AND issuetype in ({})", types));
    }
    jql
}
