//! Cluster Request / Result: per-host outbound requests and inbound outcomes
use crate::error::HostError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

/// Every node management endpoint lives under this version prefix.
pub const API_VERSION_PREFIX: &str = "v1/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostRequest {
    pub method: HttpMethod,
    /// Path relative to the node's base URL, e.g. `v1/cluster/shutdown`
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub query_params: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    /// Client-side deadline for this one request; the adapter default applies otherwise
    pub timeout: Option<Duration>,
}

impl HostRequest {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            endpoint: String::new(),
            username: None,
            password: None,
            query_params: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Set the endpoint under the management API version prefix.
    pub fn build_https_endpoint(&mut self, path: &str) {
        self.endpoint = format!("{}{}", API_VERSION_PREFIX, path.trim_start_matches('/'));
    }

    pub fn with_endpoint(mut self, path: &str) -> Self {
        self.build_https_endpoint(path);
        self
    }

    pub fn with_credentials(mut self, username: &str, password: Option<&str>) -> Self {
        self.username = Some(username.to_string());
        self.password = password.map(str::to_string);
        self
    }

    pub fn with_query_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.query_params = params;
        self
    }
}

/// One `HostRequest` per target host.
#[derive(Debug, Clone, Default)]
pub struct ClusterRequest {
    pub requests: HashMap<String, HostRequest>,
}

impl ClusterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: impl Into<String>, request: HostRequest) {
        self.requests.insert(host.into(), request);
    }

    pub fn hosts(&self) -> impl Iterator<Item = &String> {
        self.requests.keys()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Success,
    /// The node answered with a non-2xx status
    Failure,
    /// No answer at all: connection, TLS or timeout
    Exception,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostResult {
    pub host: String,
    pub status: ResultStatus,
    /// HTTP status code, 0 when the node never answered
    pub status_code: u16,
    pub content: String,
    pub err: Option<HostError>,
}

const UNAUTHORIZED: u16 = 401;

impl HostResult {
    pub fn success(host: impl Into<String>, status_code: u16, content: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            status: ResultStatus::Success,
            status_code,
            content: content.into(),
            err: None,
        }
    }

    pub fn failure(host: impl Into<String>, status_code: u16, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            host: host.into(),
            status: ResultStatus::Failure,
            status_code,
            err: Some(HostError::Http {
                status: status_code,
                body: content.clone(),
            }),
            content,
        }
    }

    pub fn exception(host: impl Into<String>, err: HostError) -> Self {
        Self {
            host: host.into(),
            status: ResultStatus::Exception,
            status_code: 0,
            content: String::new(),
            err: Some(err),
        }
    }

    pub fn is_passing(&self) -> bool {
        self.status == ResultStatus::Success && self.err.is_none()
    }

    pub fn is_failing(&self) -> bool {
        self.status == ResultStatus::Failure
    }

    pub fn is_exception(&self) -> bool {
        self.status == ResultStatus::Exception
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == UNAUTHORIZED
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.err, Some(HostError::Transport { timed_out: true, .. }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClusterResult {
    pub results: HashMap<String, HostResult>,
}

impl ClusterResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result: HostResult) {
        self.results.insert(result.host.clone(), result);
    }

    pub fn get(&self, host: &str) -> Option<&HostResult> {
        self.results.get(host)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results ordered by host so that log output and error selection are stable.
    pub fn sorted(&self) -> Vec<&HostResult> {
        let mut results: Vec<&HostResult> = self.results.values().collect();
        results.sort_by(|a, b| a.host.cmp(&b.host));
        results
    }
}
