//! `RemoteApi` over the platform's REST API.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use platsync_core::{
    Activity, ActivityId, ActivityState, BranchRequest, Config, Environment, EnvironmentId,
    Project, ProjectId,
};
use platsync_sync::{RemoteApi, RemoteError};

const TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for the platform API.
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(TIMEOUT)
            .user_agent(concat!("platsync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Base URL and token from the config, overridable by
    /// `<prefix>API_URL` and `<prefix>API_TOKEN`.
    pub fn from_config(config: &Config) -> Self {
        let base_url = std::env::var(config.env_var("API_URL")).unwrap_or_else(|_| config.api_url.clone());
        let token = std::env::var(config.env_var("API_TOKEN")).ok().filter(|t| !t.is_empty());
        Self::new(base_url, token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        let request = request.set("Accept", "application/json");
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = self.url(path);
        tracing::debug!("GET {url}");
        let response = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(|e| request_error(&url, e))?;
        decode(&url, response)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T, RemoteError> {
        let url = self.url(path);
        tracing::debug!("POST {url}");
        let response = self
            .authorize(self.agent.post(&url))
            .send_json(body)
            .map_err(|e| request_error(&url, e))?;
        decode(&url, response)
    }
}

fn request_error(url: &str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => RemoteError::Status {
            url: url.to_string(),
            status,
            message: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => RemoteError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, RemoteError> {
    response.into_json().map_err(|e| RemoteError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

impl RemoteApi for HttpApi {
    fn project(&self, id: &ProjectId) -> Result<Project, RemoteError> {
        match self.get::<ApiProject>(&format!("/projects/{id}")) {
            Ok(project) => Ok(project.into()),
            Err(RemoteError::Status { status: 404, .. }) => Err(RemoteError::ProjectNotFound(id.clone())),
            Err(err) => Err(err),
        }
    }

    fn environments(&self, project: &ProjectId) -> Result<Vec<Environment>, RemoteError> {
        let environments: Vec<ApiEnvironment> = self.get(&format!("/projects/{project}/environments"))?;
        Ok(environments.into_iter().map(Into::into).collect())
    }

    fn branch(&self, project: &ProjectId, request: &BranchRequest) -> Result<Activity, RemoteError> {
        let path = format!("/projects/{project}/environments/{}/branch", request.parent_id);
        let body = json!({
            "name": request.id.as_str(),
            "title": request.title,
            "clone_parent": request.clone_parent_data,
        });
        let response: ApiBranchResponse = self.post(&path, body)?;
        response
            .embedded
            .activities
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| RemoteError::Decode {
                url: self.url(&path),
                message: "no activity in branch response".to_string(),
            })
    }

    fn activity(&self, project: &ProjectId, id: &ActivityId) -> Result<Activity, RemoteError> {
        let activity: ApiActivity = self.get(&format!("/projects/{project}/activities/{id}"))?;
        Ok(activity.into())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiProject {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    repository: Option<ApiRepository>,
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    url: String,
}

impl From<ApiProject> for Project {
    fn from(p: ApiProject) -> Self {
        Self {
            id: ProjectId(p.id),
            title: p.title,
            host: p.region,
            repository_url: p.repository.map(|r| r.url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvironment {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    is_dirty: bool,
    #[serde(default)]
    machine_name: String,
    #[serde(default)]
    variables: BTreeMap<String, String>,
    #[serde(default, rename = "_links")]
    links: BTreeMap<String, serde_json::Value>,
}

impl From<ApiEnvironment> for Environment {
    fn from(e: ApiEnvironment) -> Self {
        let operations = e
            .links
            .keys()
            .filter_map(|rel| rel.strip_prefix('#'))
            .map(str::to_string)
            .collect();
        Self {
            id: EnvironmentId(e.id),
            title: e.title,
            parent: e.parent.map(EnvironmentId),
            is_dirty: e.is_dirty,
            machine_name: e.machine_name,
            variables: e.variables,
            operations,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiActivity {
    id: String,
    state: String,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl From<ApiActivity> for Activity {
    fn from(a: ApiActivity) -> Self {
        let state = match (a.state.as_str(), a.result.as_deref()) {
            ("complete", Some("failure")) => ActivityState::Failed,
            ("complete", _) => ActivityState::Completed,
            ("in_progress", _) => ActivityState::InProgress,
            _ => ActivityState::Pending,
        };
        Self {
            id: ActivityId(a.id),
            state,
            created_at: a.created_at,
            completed_at: a.completed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiBranchResponse {
    #[serde(rename = "_embedded")]
    embedded: ApiEmbedded,
}

#[derive(Debug, Deserialize)]
struct ApiEmbedded {
    #[serde(default)]
    activities: Vec<ApiActivity>,
}
