use crate::credentials::HttpsCredentials;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vcluster_core::{ClusterOp, ExecContext, HostRequest, HttpMethod, OpBase, OpError, Result};

pub const STOP_DB_OP: &str = "HTTPSStopDBOp";

/// Detail returned by a node after an immediate shutdown.
pub const MOVEOUT_COMPLETE: &str = "Shutdown: moveout complete";

const DRAIN_DETAIL_HINT: &str = "Set subcluster (...) to draining state ...";

// The drain detail spans several lines: drain, catalog sync, shutdown message.
static DRAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Set subcluster \(.*\) to draining state.*").expect("drain pattern is valid")
});

/// Body of `POST v1/cluster/shutdown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownResponse {
    pub detail: String,
}

/// Which up hosts receive the shutdown request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostSelection {
    /// One node is enough to shut the whole database down
    #[default]
    FirstUp,
    AllUp,
}

/// Shuts the database down, optionally draining subclusters first.
///
/// Every targeted host must confirm the shutdown with the detail matching
/// the requested mode.
pub struct StopDbOp {
    base: OpBase,
    credentials: HttpsCredentials,
    request_params: BTreeMap<String, String>,
    selection: HostSelection,
}

impl StopDbOp {
    /// `timeout` is the drain timeout in seconds, passed on to the node.
    pub fn new(timeout: Option<u32>) -> Self {
        let mut request_params = BTreeMap::new();
        if let Some(timeout) = timeout {
            request_params.insert("timeout".to_string(), timeout.to_string());
        }
        Self {
            base: OpBase::new(STOP_DB_OP),
            credentials: HttpsCredentials::none(),
            request_params,
            selection: HostSelection::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.base.name = name.into();
        self
    }

    pub fn with_password_auth(mut self, username: &str, password: Option<String>) -> Result<Self> {
        self.credentials = HttpsCredentials::password(&self.base.name, username, password)?;
        Ok(self)
    }

    pub fn with_host_selection(mut self, selection: HostSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn drains(&self) -> bool {
        self.request_params.contains_key("timeout")
    }

    fn check_detail(&self, host: &str, detail: &str) -> Result<()> {
        if self.drains() {
            if !DRAIN_PATTERN.is_match(detail) {
                return Err(OpError::mismatch(
                    &self.base.name,
                    host,
                    format!(
                        "response detail should like '{}' but got '{}'",
                        DRAIN_DETAIL_HINT, detail
                    ),
                    DRAIN_DETAIL_HINT,
                    detail,
                ));
            }
        } else if detail != MOVEOUT_COMPLETE {
            return Err(OpError::mismatch(
                &self.base.name,
                host,
                format!(
                    "response detail should be '{}' but got '{}'",
                    MOVEOUT_COMPLETE, detail
                ),
                MOVEOUT_COMPLETE,
                detail,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterOp for StopDbOp {
    fn base(&self) -> &OpBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OpBase {
        &mut self.base
    }

    async fn prepare(&mut self, ctx: &mut ExecContext) -> Result<()> {
        self.base.require_up_hosts(ctx)?;
        self.base.hosts = match self.selection {
            HostSelection::FirstUp => ctx.up_hosts.iter().take(1).cloned().collect(),
            HostSelection::AllUp => ctx.up_hosts.clone(),
        };
        ctx.dispatcher.setup(&self.base.hosts).await;

        for host in &self.base.hosts {
            let request = HostRequest::new(HttpMethod::Post)
                .with_endpoint("cluster/shutdown")
                .with_query_params(self.request_params.clone());
            self.base
                .cluster_request
                .insert(host.clone(), self.credentials.apply(request));
        }
        Ok(())
    }

    fn process_result(&mut self, _ctx: &mut ExecContext) -> Result<()> {
        let mut last_err = None;
        let mut failed = 0usize;

        for result in self.base.cluster_result.sorted() {
            self.base.log_response(&result.host, result);

            if result.is_unauthorized() {
                return Err(self.base.host_failure(result));
            }

            let checked = if result.is_passing() {
                self.base
                    .parse_and_check_response::<ShutdownResponse>(&result.host, &result.content)
                    .and_then(|response| self.check_detail(&result.host, &response.detail))
            } else {
                Err(self.base.host_failure(result))
            };

            if let Err(err) = checked {
                tracing::error!(op = %self.base.name, host = %result.host, error = %err, "shutdown not confirmed");
                failed += 1;
                last_err = Some(err);
            }
        }

        match last_err {
            None => Ok(()),
            Some(err) => {
                tracing::error!(
                    op = %self.base.name,
                    failed,
                    total = self.base.cluster_result.len(),
                    "database stop failed"
                );
                Err(err)
            }
        }
    }
}
