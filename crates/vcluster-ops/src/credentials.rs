use std::fmt;
use vcluster_core::{HostRequest, OpError, Result};

/// Fail when password authentication is requested without a username.
pub fn validate_username_and_password(op_name: &str, use_password: bool, username: &str) -> Result<()> {
    if use_password && username.trim().is_empty() {
        return Err(OpError::configuration(
            op_name,
            "should provide a username when password authentication is requested",
        ));
    }
    Ok(())
}

/// Basic-auth settings of one operation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HttpsCredentials {
    use_password: bool,
    username: String,
    password: Option<String>,
}

impl HttpsCredentials {
    /// Certificate-only authentication; requests carry no basic auth.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn password(op_name: &str, username: &str, password: Option<String>) -> Result<Self> {
        validate_username_and_password(op_name, true, username)?;
        Ok(Self {
            use_password: true,
            username: username.to_string(),
            password,
        })
    }

    pub fn apply(&self, request: HostRequest) -> HostRequest {
        if self.use_password {
            request.with_credentials(&self.username, self.password.as_deref())
        } else {
            request
        }
    }
}

impl fmt::Debug for HttpsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpsCredentials")
            .field("use_password", &self.use_password)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcluster_core::HttpMethod;

    #[test]
    fn test_password_without_username_is_rejected() {
        let err = HttpsCredentials::password("StopDbOp", "  ", Some("pw".into())).unwrap_err();
        assert!(matches!(err, OpError::Configuration { ref op, .. } if op == "StopDbOp"));
        assert!(validate_username_and_password("op", false, "").is_ok());
    }

    #[test]
    fn test_apply_only_with_password_auth() {
        let plain = HttpsCredentials::none().apply(HostRequest::new(HttpMethod::Get));
        assert_eq!(plain.username, None);

        let creds = HttpsCredentials::password("op", "dbadmin", Some("pw".into())).unwrap();
        let request = creds.apply(HostRequest::new(HttpMethod::Get));
        assert_eq!(request.username.as_deref(), Some("dbadmin"));
        assert_eq!(request.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = HttpsCredentials::password("op", "dbadmin", Some("hunter2".into())).unwrap();
        let text = format!("{:?}", creds);
        assert!(text.contains("dbadmin"));
        assert!(!text.contains("hunter2"));
    }
}
