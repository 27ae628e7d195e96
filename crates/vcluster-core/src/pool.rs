//! Adapter pool: process-wide registry of host adapters.
//!
//! Entries are created on first use and never evicted, so a host's adapter is
//! written once and read-only afterwards.

use crate::adapter::{AdapterFactory, HostAdapter};
use crate::cluster::{ClusterRequest, ClusterResult, HostResult};
use crate::error::{DispatchError, HostError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

pub struct AdapterPool {
    connections: RwLock<HashMap<String, Arc<dyn HostAdapter>>>,
    factory: Arc<dyn AdapterFactory>,
}

impl AdapterPool {
    pub fn new(factory: Arc<dyn AdapterFactory>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            factory,
        }
    }

    /// Make sure every host has an adapter. Existing entries, including ones
    /// for hosts outside `hosts`, are left untouched.
    pub async fn setup(&self, hosts: &[String]) {
        let mut connections = self.connections.write().await;
        for host in hosts {
            if !connections.contains_key(host) {
                tracing::debug!(host = %host, "creating host adapter");
                connections.insert(host.clone(), self.factory.create(host));
            }
        }
    }

    pub async fn get(&self, host: &str) -> Option<Arc<dyn HostAdapter>> {
        self.connections.read().await.get(host).cloned()
    }

    pub async fn contains(&self, host: &str) -> bool {
        self.connections.read().await.contains_key(host)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Send every host's request concurrently and wait for all of them.
    ///
    /// A host whose send fails, or whose send task panics, still yields a
    /// `HostResult`; only a request for an unknown host is a `DispatchError`.
    pub async fn send_request(
        &self,
        request: &ClusterRequest,
    ) -> Result<ClusterResult, DispatchError> {
        let mut targets = Vec::with_capacity(request.len());
        {
            let connections = self.connections.read().await;
            for (host, host_request) in &request.requests {
                let adapter = connections
                    .get(host)
                    .cloned()
                    .ok_or_else(|| DispatchError::MissingAdapter(host.clone()))?;
                targets.push((adapter, host_request.clone()));
            }
        }

        let mut tasks: JoinSet<HostResult> = JoinSet::new();
        for (adapter, host_request) in targets {
            tasks.spawn(async move { adapter.send_request(&host_request).await });
        }

        let mut result = ClusterResult::new();
        let mut lost = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(host_result) => result.insert(host_result),
                Err(err) => lost.push(err.to_string()),
            }
        }

        // A panicked send leaves its host without a result; the siblings were
        // still awaited, so only that host is marked as an exception.
        let message = if lost.is_empty() {
            "adapter returned no result".to_string()
        } else {
            format!("send task failed: {}", lost.join("; "))
        };
        for host in request.hosts() {
            if result.get(host).is_none() {
                tracing::warn!(host = %host, error = %message, "no result for host");
                result.insert(HostResult::exception(
                    host.clone(),
                    HostError::Transport {
                        message: message.clone(),
                        timed_out: false,
                    },
                ));
            }
        }

        Ok(result)
    }
}
