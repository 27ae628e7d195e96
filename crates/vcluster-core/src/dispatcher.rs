//! Request dispatcher: decouples operations from the transport.
use crate::adapter::{AdapterFactory, HttpsAdapterFactory};
use crate::cluster::{ClusterRequest, ClusterResult};
use crate::config::ClientConfig;
use crate::error::{ConfigError, DispatchError};
use crate::pool::AdapterPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct RequestDispatcher {
    pool: Arc<AdapterPool>,
}

impl RequestDispatcher {
    pub fn new(pool: Arc<AdapterPool>) -> Self {
        Self { pool }
    }

    /// Dispatcher over a fresh pool of HTTPS adapters.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let factory = HttpsAdapterFactory::new(config)?;
        Ok(Self::with_factory(Arc::new(factory)))
    }

    pub fn with_factory(factory: Arc<dyn AdapterFactory>) -> Self {
        Self::new(Arc::new(AdapterPool::new(factory)))
    }

    pub fn pool(&self) -> &Arc<AdapterPool> {
        &self.pool
    }

    pub async fn setup(&self, hosts: &[String]) {
        self.pool.setup(hosts).await;
    }

    /// Fan the request out to every host it names. The returned map is the
    /// authoritative outcome; an `Err` only means nothing usable was dispatched.
    pub async fn send_request(
        &self,
        request: &ClusterRequest,
    ) -> Result<ClusterResult, DispatchError> {
        tracing::info!(hosts = request.len(), "dispatching cluster request");
        let result = self.pool.send_request(request).await?;
        let passing = result.results.values().filter(|r| r.is_passing()).count();
        tracing::debug!(passing, total = result.len(), "cluster request complete");
        Ok(result)
    }
}
