//! Unified error model for operations, dispatch and configuration.
use thiserror::Error;

/// Failure of one operation stage. Every variant names the operation so the
/// engine can surface it verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    #[error("PRECONDITION/[{op}] {message}")]
    Precondition { op: String, message: String },

    #[error("CONFIG/[{op}] {message}")]
    Configuration { op: String, message: String },

    #[error("EXEC/[{op}] {source}")]
    Execution {
        op: String,
        #[source]
        source: DispatchError,
    },

    #[error("TRANSPORT/[{op}] host {host}: {source}")]
    Transport {
        op: String,
        host: String,
        #[source]
        source: HostError,
    },

    #[error("AUTH/[{op}] host {host} rejected the credentials: {message}")]
    Authorization {
        op: String,
        host: String,
        message: String,
    },

    #[error("SHAPE/[{op}] fail to parse result on host {host}, details: {message}")]
    ResponseShape {
        op: String,
        host: String,
        message: String,
    },

    #[error("MISMATCH/[{op}] host {host}: {message}")]
    SemanticMismatch {
        op: String,
        host: String,
        message: String,
        expected: String,
        actual: String,
    },
}

impl OpError {
    pub fn precondition(op: &str, message: impl Into<String>) -> Self {
        Self::Precondition {
            op: op.to_string(),
            message: message.into(),
        }
    }

    pub fn configuration(op: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            op: op.to_string(),
            message: message.into(),
        }
    }

    pub fn mismatch(
        op: &str,
        host: &str,
        message: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::SemanticMismatch {
            op: op.to_string(),
            host: host.to_string(),
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Name of the operation that produced the error.
    pub fn op_name(&self) -> &str {
        match self {
            Self::Precondition { op, .. }
            | Self::Configuration { op, .. }
            | Self::Execution { op, .. }
            | Self::Transport { op, .. }
            | Self::Authorization { op, .. }
            | Self::ResponseShape { op, .. }
            | Self::SemanticMismatch { op, .. } => op,
        }
    }

    /// Offending host, when the failure is scoped to one.
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::Transport { host, .. }
            | Self::Authorization { host, .. }
            | Self::ResponseShape { host, .. }
            | Self::SemanticMismatch { host, .. } => Some(host),
            _ => None,
        }
    }
}

/// Per-host failure captured inside a `HostResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("request failed: {message}")]
    Transport { message: String, timed_out: bool },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("invalid endpoint {url}: {message}")]
    InvalidEndpoint { url: String, message: String },
}

/// Failure to dispatch a cluster request at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no adapter in pool for host {0}; dispatcher setup was not called for it")]
    MissingAdapter(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/io: {0}")]
    Io(#[from] std::io::Error),

    #[error("CONFIG/yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CONFIG/env: {name}={value}: {message}")]
    InvalidEnv {
        name: String,
        value: String,
        message: String,
    },

    #[error("CONFIG/invalid: {0}")]
    Invalid(String),
}

pub type Result<T, E = OpError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_operation_and_host() {
        let err = OpError::mismatch(
            "CheckSubclusterOp",
            "10.0.0.1",
            "new subcluster name should be 'sc1' but got 'sc2'",
            "sc1",
            "sc2",
        );
        let text = err.to_string();
        assert!(text.starts_with("MISMATCH/[CheckSubclusterOp]"));
        assert!(text.contains("10.0.0.1"));
        assert!(text.contains("'sc1'"));
        assert_eq!(err.host(), Some("10.0.0.1"));
        assert_eq!(err.op_name(), "CheckSubclusterOp");
    }

    #[test]
    fn test_host_scope() {
        let auth = OpError::Authorization {
            op: "op".into(),
            host: "h".into(),
            message: "401".into(),
        };
        assert_eq!(auth.host(), Some("h"));
        assert_eq!(OpError::precondition("op", "x").host(), None);
    }
}
