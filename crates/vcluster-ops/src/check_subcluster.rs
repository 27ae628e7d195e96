use crate::credentials::HttpsCredentials;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vcluster_core::{ClusterOp, ExecContext, HostRequest, HttpMethod, OpBase, OpError, Result};

pub const CHECK_SUBCLUSTER_OP: &str = "HTTPSCheckSubclusterOp";

/// Context metadata key holding the confirmed `SubclusterInfo`.
pub const SUBCLUSTER_INFO_KEY: &str = "subcluster_info";

/// Body of `GET v1/subclusters/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubclusterInfo {
    pub subcluster_name: String,
    pub control_set_size: i64,
    pub is_secondary: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub sandbox: String,
}

/// Confirms that a subcluster exists with the expected role and control set size.
///
/// One host answering with matching data is enough; hosts with server errors
/// are skipped in favour of the next one.
pub struct CheckSubclusterOp {
    base: OpBase,
    credentials: HttpsCredentials,
    sc_name: String,
    is_secondary: bool,
    ctl_set_size: i64,
}

impl CheckSubclusterOp {
    pub fn new(sc_name: impl Into<String>, is_primary: bool, ctl_set_size: i64) -> Self {
        Self {
            base: OpBase::new(CHECK_SUBCLUSTER_OP),
            credentials: HttpsCredentials::none(),
            sc_name: sc_name.into(),
            is_secondary: !is_primary,
            ctl_set_size,
        }
    }

    pub fn with_password_auth(mut self, username: &str, password: Option<String>) -> Result<Self> {
        self.credentials = HttpsCredentials::password(&self.base.name, username, password)?;
        Ok(self)
    }

    fn role(is_secondary: bool) -> &'static str {
        if is_secondary { "secondary" } else { "primary" }
    }

    fn check_info(&self, host: &str, info: &SubclusterInfo) -> Result<()> {
        let op = &self.base.name;
        if info.subcluster_name != self.sc_name {
            return Err(OpError::mismatch(
                op,
                host,
                format!(
                    "new subcluster name should be '{}' but got '{}'",
                    self.sc_name, info.subcluster_name
                ),
                &self.sc_name,
                &info.subcluster_name,
            ));
        }
        if info.is_secondary != self.is_secondary {
            let expected = Self::role(self.is_secondary);
            let actual = Self::role(info.is_secondary);
            return Err(OpError::mismatch(
                op,
                host,
                format!(
                    "new subcluster should be a {} subcluster but got a {} subcluster",
                    expected, actual
                ),
                expected,
                actual,
            ));
        }
        if info.control_set_size != self.ctl_set_size {
            return Err(OpError::mismatch(
                op,
                host,
                format!(
                    "new subcluster should have control set size as {} but got {}",
                    self.ctl_set_size, info.control_set_size
                ),
                self.ctl_set_size,
                info.control_set_size,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterOp for CheckSubclusterOp {
    fn base(&self) -> &OpBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OpBase {
        &mut self.base
    }

    async fn prepare(&mut self, ctx: &mut ExecContext) -> Result<()> {
        self.base.require_up_hosts(ctx)?;
        self.base.hosts = ctx.up_hosts.clone();
        ctx.dispatcher.setup(&self.base.hosts).await;

        let endpoint = format!("subclusters/{}", self.sc_name);
        for host in &self.base.hosts {
            let request = self
                .credentials
                .apply(HostRequest::new(HttpMethod::Get).with_endpoint(&endpoint));
            self.base.cluster_request.insert(host.clone(), request);
        }
        Ok(())
    }

    fn process_result(&mut self, ctx: &mut ExecContext) -> Result<()> {
        let mut last_err = None;

        for result in self.base.cluster_result.sorted() {
            self.base.log_response(&result.host, result);

            if result.is_unauthorized() {
                // every host would reject the same credentials
                return Err(self.base.host_failure(result));
            }
            if !result.is_passing() {
                last_err = Some(self.base.host_failure(result));
                continue;
            }

            let info: SubclusterInfo =
                self.base.parse_and_check_response(&result.host, &result.content)?;
            self.check_info(&result.host, &info)?;

            ctx.set_metadata(SUBCLUSTER_INFO_KEY, &info)
                .map_err(|e| OpError::ResponseShape {
                    op: self.base.name.clone(),
                    host: result.host.clone(),
                    message: e.to_string(),
                })?;
            tracing::info!(
                op = %self.base.name,
                host = %result.host,
                subcluster = %info.subcluster_name,
                "subcluster confirmed"
            );
            return Ok(());
        }

        Err(last_err.unwrap_or_else(|| {
            OpError::precondition(&self.base.name, "no host returned a result to check")
        }))
    }
}
