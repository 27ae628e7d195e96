//! In-memory adapters for exercising operations without cluster nodes.
use crate::adapter::{AdapterFactory, HostAdapter};
use crate::cluster::{HostRequest, HostResult};
use crate::dispatcher::RequestDispatcher;
use crate::error::HostError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type Responder = dyn Fn(&str, &HostRequest) -> HostResult + Send + Sync;

struct Script {
    responder: Box<Responder>,
    sent: Mutex<Vec<(String, HostRequest)>>,
    created: AtomicUsize,
}

/// Factory whose adapters answer through a closure and record every request.
#[derive(Clone)]
pub struct ScriptedAdapterFactory {
    script: Arc<Script>,
}

impl ScriptedAdapterFactory {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &HostRequest) -> HostResult + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(Script {
                responder: Box::new(responder),
                sent: Mutex::new(Vec::new()),
                created: AtomicUsize::new(0),
            }),
        }
    }

    /// Fixed answer per host; hosts without one get a connection-refused exception.
    pub fn with_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = HostResult>,
    {
        let by_host: HashMap<String, HostResult> =
            results.into_iter().map(|r| (r.host.clone(), r)).collect();
        Self::new(move |host, _| {
            by_host.get(host).cloned().unwrap_or_else(|| {
                HostResult::exception(
                    host,
                    HostError::Transport {
                        message: "connection refused".to_string(),
                        timed_out: false,
                    },
                )
            })
        })
    }

    pub fn dispatcher(&self) -> RequestDispatcher {
        RequestDispatcher::with_factory(Arc::new(self.clone()))
    }

    pub fn sent_requests(&self) -> Vec<(String, HostRequest)> {
        self.script
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of adapters created so far.
    pub fn created(&self) -> usize {
        self.script.created.load(Ordering::SeqCst)
    }
}

impl AdapterFactory for ScriptedAdapterFactory {
    fn create(&self, host: &str) -> Arc<dyn HostAdapter> {
        self.script.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(ScriptedAdapter {
            host: host.to_string(),
            script: self.script.clone(),
        })
    }
}

struct ScriptedAdapter {
    host: String,
    script: Arc<Script>,
}

#[async_trait]
impl HostAdapter for ScriptedAdapter {
    fn host(&self) -> &str {
        &self.host
    }

    async fn send_request(&self, request: &HostRequest) -> HostResult {
        self.script
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((self.host.clone(), request.clone()));
        (self.script.responder)(&self.host, request)
    }
}
