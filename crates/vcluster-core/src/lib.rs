//! vcluster core: operation lifecycle, engine and pooled request dispatch.
//!
//! Every administrative action is an operation that builds one request per
//! host, has the dispatcher fan them out concurrently through pooled
//! adapters, then judges the per-host results into a single verdict.
//!
//! # Pipeline Flow
//!
//! ```text
//! OpEngine ──► prepare ──► execute ──► process_result ──► finalize ──► next op
//!                 │            │
//!                 ▼            ▼
//!           dispatcher.setup  dispatcher.send_request ──► AdapterPool ──► host 1..n
//! ```

pub mod adapter;
pub mod cluster;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod operation;
pub mod pool;
pub mod telemetry;
pub mod testing;

pub use adapter::{AdapterFactory, HostAdapter, HttpsAdapter, HttpsAdapterFactory};
pub use cluster::{ClusterRequest, ClusterResult, HostRequest, HostResult, HttpMethod, ResultStatus};
pub use config::{ClientConfig, LogConfig};
pub use context::ExecContext;
pub use dispatcher::RequestDispatcher;
pub use engine::{EngineReport, OpEngine, OpRecord};
pub use error::{ConfigError, DispatchError, HostError, OpError, Result};
pub use operation::{ClusterOp, OpBase, OpState};
pub use pool::AdapterPool;
