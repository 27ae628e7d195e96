//! Operation trait: the four-stage contract every cluster operation follows
//!
//! `prepare → execute → process_result → finalize`, driven by `OpEngine`.
use crate::cluster::{ClusterRequest, ClusterResult, HostResult};
use crate::context::ExecContext;
use crate::error::{HostError, OpError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpState {
    Created,
    Prepared,
    Executed,
    ResultProcessed,
    Finalized,
    Failed,
}

impl fmt::Display for OpState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Self::Created => "created",
            Self::Prepared => "prepared",
            Self::Executed => "executed",
            Self::ResultProcessed => "result_processed",
            Self::Finalized => "finalized",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Working state shared by all operations: name, lifecycle state and the
/// request/result pair of the current run.
#[derive(Debug)]
pub struct OpBase {
    pub name: String,
    pub state: OpState,
    /// Hosts targeted by `prepare`
    pub hosts: Vec<String>,
    pub cluster_request: ClusterRequest,
    pub cluster_result: ClusterResult,
}

impl OpBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: OpState::Created,
            hosts: Vec::new(),
            cluster_request: ClusterRequest::new(),
            cluster_result: ClusterResult::new(),
        }
    }

    /// Drop the targets, request and result of a previous run.
    pub fn reset(&mut self) {
        self.state = OpState::Created;
        self.hosts.clear();
        self.cluster_request = ClusterRequest::new();
        self.cluster_result = ClusterResult::new();
    }

    pub fn require_up_hosts(&self, ctx: &ExecContext) -> Result<()> {
        if ctx.up_hosts.is_empty() {
            return Err(OpError::precondition(
                &self.name,
                "Cannot find any up hosts in OpEngineExecContext",
            ));
        }
        Ok(())
    }

    /// Send the prepared request and keep the per-host results.
    pub async fn run_execute(&mut self, ctx: &ExecContext) -> Result<()> {
        let result = ctx
            .dispatcher
            .send_request(&self.cluster_request)
            .await
            .map_err(|source| OpError::Execution {
                op: self.name.clone(),
                source,
            })?;
        self.cluster_result = result;
        Ok(())
    }

    pub fn log_response(&self, host: &str, result: &HostResult) {
        if result.is_failing() {
            tracing::warn!(
                op = %self.name,
                host,
                code = result.status_code,
                content = %result.content,
                "host returned an error status"
            );
        } else if let Some(err) = result.err.as_ref().filter(|_| result.is_exception()) {
            tracing::warn!(op = %self.name, host, error = %err, "host request failed");
        } else {
            tracing::debug!(
                op = %self.name,
                host,
                status = ?result.status,
                code = result.status_code,
                content = %result.content,
                "host response"
            );
        }
    }

    /// Decode a passing host's JSON body into the operation's response type.
    pub fn parse_and_check_response<T: DeserializeOwned>(&self, host: &str, content: &str) -> Result<T> {
        serde_json::from_str(content).map_err(|e| OpError::ResponseShape {
            op: self.name.clone(),
            host: host.to_string(),
            message: e.to_string(),
        })
    }

    /// Map a non-passing host result to the operation-level error.
    pub fn host_failure(&self, result: &HostResult) -> OpError {
        if result.is_unauthorized() {
            return OpError::Authorization {
                op: self.name.clone(),
                host: result.host.clone(),
                message: result.content.clone(),
            };
        }
        let source = result.err.clone().unwrap_or_else(|| HostError::Http {
            status: result.status_code,
            body: result.content.clone(),
        });
        OpError::Transport {
            op: self.name.clone(),
            host: result.host.clone(),
            source,
        }
    }
}

/// Contract for one cluster operation.
///
/// Implementations own their `OpBase`; the engine records state transitions
/// on it, so stages only build requests and judge results.
#[async_trait]
pub trait ClusterOp: Send {
    fn base(&self) -> &OpBase;

    fn base_mut(&mut self) -> &mut OpBase;

    fn name(&self) -> &str {
        &self.base().name
    }

    fn state(&self) -> OpState {
        self.base().state
    }

    /// Check preconditions, set up adapters, build one request per host.
    async fn prepare(&mut self, ctx: &mut ExecContext) -> Result<()>;

    async fn execute(&mut self, ctx: &mut ExecContext) -> Result<()> {
        self.base_mut().run_execute(ctx).await
    }

    /// Judge the per-host results and produce the operation's verdict.
    fn process_result(&mut self, ctx: &mut ExecContext) -> Result<()>;

    /// Release operation-scoped resources. Runs after every attempted operation.
    fn finalize(&mut self, _ctx: &mut ExecContext) {}
}
