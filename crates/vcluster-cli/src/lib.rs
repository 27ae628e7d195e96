//! vcluster driver: turns `VCLUSTER_*` variables into one pipeline run.
//!
//! ```text
//! VCLUSTER_HOSTS            comma separated up hosts (required)
//! VCLUSTER_ACTION           check-subcluster | stop-db (required)
//! VCLUSTER_SUBCLUSTER       subcluster to confirm (check-subcluster)
//! VCLUSTER_IS_PRIMARY       expected role, default false
//! VCLUSTER_CONTROL_SET_SIZE expected control set size, default 0
//! VCLUSTER_DRAIN_TIMEOUT    drain seconds before shutdown (stop-db)
//! VCLUSTER_USERNAME         basic auth user
//! VCLUSTER_PASSWORD         basic auth password
//! ```
use anyhow::{Context, Result, anyhow, bail};
use vcluster_core::{ClientConfig, EngineReport, ExecContext, OpEngine, RequestDispatcher};
use vcluster_ops::{
    PasswordAuth, SUBCLUSTER_INFO_KEY, SubclusterInfo, check_subcluster_pipeline,
    stop_db_pipeline,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CheckSubcluster {
        name: String,
        is_primary: bool,
        control_set_size: i64,
    },
    StopDb {
        drain_timeout: Option<u32>,
    },
}

pub struct Invocation {
    pub hosts: Vec<String>,
    pub action: Action,
    pub auth: Option<PasswordAuth>,
}

impl Invocation {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hosts: Vec<String> = lookup("VCLUSTER_HOSTS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect();
        if hosts.is_empty() {
            bail!("VCLUSTER_HOSTS must name at least one host");
        }

        let action = match lookup("VCLUSTER_ACTION").as_deref() {
            Some("check-subcluster") => Action::CheckSubcluster {
                name: lookup("VCLUSTER_SUBCLUSTER")
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| anyhow!("VCLUSTER_SUBCLUSTER is required for check-subcluster"))?,
                is_primary: parse_var(&lookup, "VCLUSTER_IS_PRIMARY")?.unwrap_or(false),
                control_set_size: parse_var(&lookup, "VCLUSTER_CONTROL_SET_SIZE")?.unwrap_or(0),
            },
            Some("stop-db") => Action::StopDb {
                drain_timeout: parse_var(&lookup, "VCLUSTER_DRAIN_TIMEOUT")?,
            },
            Some(other) => bail!("unknown VCLUSTER_ACTION '{}'", other),
            None => bail!("VCLUSTER_ACTION is required"),
        };

        // A password without a user is passed through so the operation rejects it
        let password = lookup("VCLUSTER_PASSWORD");
        let auth = match lookup("VCLUSTER_USERNAME") {
            Some(username) => Some(PasswordAuth { username, password }),
            None if password.is_some() => Some(PasswordAuth {
                username: String::new(),
                password,
            }),
            None => None,
        };

        Ok(Self {
            hosts,
            action,
            auth,
        })
    }

    pub fn engine(&self) -> Result<OpEngine> {
        let engine = match &self.action {
            Action::CheckSubcluster {
                name,
                is_primary,
                control_set_size,
            } => check_subcluster_pipeline(name, *is_primary, *control_set_size, self.auth.as_ref())?,
            Action::StopDb { drain_timeout } => stop_db_pipeline(*drain_timeout, self.auth.as_ref())?,
        };
        Ok(engine)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .with_context(|| format!("invalid {} '{}'", name, value))
        })
        .transpose()
}

/// Run the invocation's pipeline over a fresh HTTPS dispatcher.
pub async fn run(invocation: &Invocation, config: &ClientConfig) -> Result<EngineReport> {
    let dispatcher =
        RequestDispatcher::from_config(config).context("failed to build the HTTPS client")?;
    let mut ctx = ExecContext::new(invocation.hosts.clone(), dispatcher);
    let mut engine = invocation.engine()?;

    let report = engine
        .run(&mut ctx)
        .await
        .with_context(|| format!("pipeline {} failed", engine.pipeline_id()))?;

    if let Some(info) = ctx.metadata_as::<SubclusterInfo>(SUBCLUSTER_INFO_KEY) {
        tracing::info!(
            subcluster = %info.subcluster_name,
            control_set_size = info.control_set_size,
            is_secondary = info.is_secondary,
            "subcluster confirmed"
        );
    }
    Ok(report)
}
