//! vcluster operations: concrete `ClusterOp`s run by the engine.
//!
//! # Operations
//!
//! ```text
//! CheckSubclusterOp  GET  v1/subclusters/<name>   one matching host confirms
//! StopDbOp           POST v1/cluster/shutdown     every targeted host must confirm
//! ```

mod check_subcluster;
mod credentials;
mod stop_db;

pub use check_subcluster::{
    CHECK_SUBCLUSTER_OP, CheckSubclusterOp, SUBCLUSTER_INFO_KEY, SubclusterInfo,
};
pub use credentials::{HttpsCredentials, validate_username_and_password};
pub use stop_db::{HostSelection, MOVEOUT_COMPLETE, STOP_DB_OP, ShutdownResponse, StopDbOp};

use vcluster_core::{OpEngine, Result};

/// Optional basic-auth pair applied to every operation of a pipeline.
#[derive(Clone, Default)]
pub struct PasswordAuth {
    pub username: String,
    pub password: Option<String>,
}

/// Engine that confirms a freshly added subcluster.
pub fn check_subcluster_pipeline(
    sc_name: &str,
    is_primary: bool,
    ctl_set_size: i64,
    auth: Option<&PasswordAuth>,
) -> Result<OpEngine> {
    let mut op = CheckSubclusterOp::new(sc_name, is_primary, ctl_set_size);
    if let Some(auth) = auth {
        op = op.with_password_auth(&auth.username, auth.password.clone())?;
    }
    Ok(OpEngine::new(vec![Box::new(op)]))
}

/// Engine that stops the database through the first up host.
pub fn stop_db_pipeline(drain_timeout: Option<u32>, auth: Option<&PasswordAuth>) -> Result<OpEngine> {
    let mut op = StopDbOp::new(drain_timeout);
    if let Some(auth) = auth {
        op = op.with_password_auth(&auth.username, auth.password.clone())?;
    }
    Ok(OpEngine::new(vec![Box::new(op)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcluster_core::OpError;

    #[test]
    fn test_pipeline_builders() {
        let engine = check_subcluster_pipeline("sc1", true, 3, None).unwrap();
        assert_eq!(engine.pipeline_id(), CHECK_SUBCLUSTER_OP);
        assert_eq!(engine.len(), 1);

        let engine = stop_db_pipeline(Some(60), None).unwrap();
        assert_eq!(engine.pipeline_id(), STOP_DB_OP);
    }

    #[test]
    fn test_builders_reject_password_without_username() {
        let auth = PasswordAuth {
            username: String::new(),
            password: Some("pw".into()),
        };
        let err = stop_db_pipeline(None, Some(&auth)).err().unwrap();
        assert!(matches!(err, OpError::Configuration { .. }));
        assert!(check_subcluster_pipeline("sc1", true, 3, Some(&auth)).is_err());
    }
}
