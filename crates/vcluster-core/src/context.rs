//! Execution Context: state shared by the operations of one pipeline run
use crate::dispatcher::RequestDispatcher;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub struct ExecContext {
    pub trace_id: String,
    /// Reachable hosts, possibly narrowed by earlier operations
    pub up_hosts: Vec<String>,
    pub dispatcher: RequestDispatcher,
    pub metadata: HashMap<String, Value>,
}

impl ExecContext {
    pub fn new(up_hosts: Vec<String>, dispatcher: RequestDispatcher) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            up_hosts,
            dispatcher,
            metadata: HashMap::new(),
        }
    }

    /// Keep only the up hosts matching `keep`, preserving order.
    pub fn retain_up_hosts<F>(&mut self, keep: F)
    where
        F: FnMut(&String) -> bool,
    {
        self.up_hosts.retain(keep);
    }

    pub fn first_up_host(&self) -> Option<&String> {
        self.up_hosts.first()
    }

    pub fn set_metadata<T: Serialize>(&mut self, key: &str, value: &T) -> serde_json::Result<()> {
        self.metadata.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn metadata_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.metadata
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
