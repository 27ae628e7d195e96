//! Operation Engine: runs operations in order and stops at the first failure
use crate::context::ExecContext;
use crate::error::Result;
use crate::operation::{ClusterOp, OpState};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::Instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpRecord {
    pub name: String,
    pub state: OpState,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReport {
    pub pipeline_id: String,
    pub trace_id: String,
    pub records: Vec<OpRecord>,
    /// Up hosts left in the context after the last operation
    pub up_hosts: Vec<String>,
}

pub struct OpEngine {
    ops: Vec<Box<dyn ClusterOp>>,
    pipeline_id: String,
    records: Vec<OpRecord>,
}

impl OpEngine {
    pub fn new(ops: Vec<Box<dyn ClusterOp>>) -> Self {
        let pipeline_id = ops
            .iter()
            .map(|op| op.name().to_string())
            .collect::<Vec<_>>()
            .join("→");

        Self {
            ops,
            pipeline_id,
            records: Vec::new(),
        }
    }

    /// Run every operation against `ctx`. The first failing operation's error
    /// is returned as is and the remaining operations are not run.
    pub async fn run(&mut self, ctx: &mut ExecContext) -> Result<EngineReport> {
        let span = tracing::info_span!(
            "pipeline",
            trace_id = %ctx.trace_id,
            pipeline = %self.pipeline_id
        );
        self.run_all(ctx).instrument(span).await
    }

    async fn run_all(&mut self, ctx: &mut ExecContext) -> Result<EngineReport> {
        self.records.clear();

        for op in self.ops.iter_mut() {
            let start = Instant::now();
            tracing::info!(op = %op.name(), "running operation");

            let outcome = run_stages(op.as_mut(), ctx).await;
            op.finalize(ctx);
            if outcome.is_ok() {
                op.base_mut().state = OpState::Finalized;
            }

            self.records.push(OpRecord {
                name: op.name().to_string(),
                state: op.state(),
                latency_ms: start.elapsed().as_millis() as u64,
            });

            if let Err(err) = outcome {
                tracing::error!(op = %op.name(), error = %err, "operation failed");
                return Err(err);
            }
        }

        tracing::info!(ops = self.records.len(), "pipeline complete");
        Ok(EngineReport {
            pipeline_id: self.pipeline_id.clone(),
            trace_id: ctx.trace_id.clone(),
            records: self.records.clone(),
            up_hosts: ctx.up_hosts.clone(),
        })
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    /// Records of the last run, including the failed operation if there was one.
    pub fn records(&self) -> &[OpRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

async fn run_stages(op: &mut dyn ClusterOp, ctx: &mut ExecContext) -> Result<()> {
    let outcome = advance(op, ctx).await;
    if outcome.is_err() {
        op.base_mut().state = OpState::Failed;
    }
    outcome
}

async fn advance(op: &mut dyn ClusterOp, ctx: &mut ExecContext) -> Result<()> {
    // an engine may be run again; each run targets only the current up hosts
    op.base_mut().reset();
    op.prepare(ctx).await?;
    op.base_mut().state = OpState::Prepared;
    tracing::debug!(op = %op.name(), hosts = op.base().cluster_request.len(), "prepared");

    op.execute(ctx).await?;
    op.base_mut().state = OpState::Executed;
    tracing::debug!(op = %op.name(), results = op.base().cluster_result.len(), "executed");

    op.process_result(ctx)?;
    op.base_mut().state = OpState::ResultProcessed;
    Ok(())
}
