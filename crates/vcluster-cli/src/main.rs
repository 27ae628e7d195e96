//! Binary entrypoint for the vcluster driver.
use vcluster_cli::{Invocation, run};
use vcluster_core::ClientConfig;
use vcluster_core::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    init_tracing(&config.log);

    let invocation = Invocation::from_env()?;
    let report = run(&invocation, &config).await?;

    tracing::info!(pipeline = %report.pipeline_id, trace_id = %report.trace_id, "done");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
