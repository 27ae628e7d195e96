//! Host connection adapters: one logical connection per cluster node.
use crate::cluster::{HostRequest, HostResult, HttpMethod};
use crate::config::ClientConfig;
use crate::error::{ConfigError, HostError};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use std::net::{Ipv6Addr, SocketAddr};
use std::sync::Arc;

/// Sends one request to one host and reports the raw outcome.
///
/// Implementations never return an error: transport failures become a
/// `HostResult` with `ResultStatus::Exception` so sibling hosts are unaffected.
#[async_trait]
pub trait HostAdapter: Send + Sync {
    fn host(&self) -> &str;

    async fn send_request(&self, request: &HostRequest) -> HostResult;
}

/// Creates adapters for hosts the pool has not seen yet.
pub trait AdapterFactory: Send + Sync {
    fn create(&self, host: &str) -> Arc<dyn HostAdapter>;
}

pub struct HttpsAdapter {
    host: String,
    base_url: String,
    client: Client,
}

impl HttpsAdapter {
    pub fn new(host: &str, scheme: &str, default_port: u16, client: Client) -> Self {
        Self {
            host: host.to_string(),
            base_url: format!("{}://{}", scheme, authority(host, default_port)),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, request: &HostRequest) -> Result<Url, HostError> {
        let raw = format!("{}/{}", self.base_url, request.endpoint);
        let mut url = Url::parse(&raw).map_err(|e| HostError::InvalidEndpoint {
            url: raw.clone(),
            message: e.to_string(),
        })?;

        if !request.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query_params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl HostAdapter for HttpsAdapter {
    fn host(&self) -> &str {
        &self.host
    }

    async fn send_request(&self, request: &HostRequest) -> HostResult {
        let url = match self.build_url(request) {
            Ok(url) => url,
            Err(err) => return HostResult::exception(&self.host, err),
        };

        tracing::debug!(
            host = %self.host,
            method = %request.method,
            endpoint = %request.endpoint,
            "sending host request"
        );

        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        if let Some(username) = &request.username {
            builder = builder.basic_auth(username, request.password.as_ref());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(error) => {
                return HostResult::exception(
                    &self.host,
                    HostError::Transport {
                        message: error.to_string(),
                        timed_out: error.is_timeout(),
                    },
                );
            }
        };

        let status = response.status();
        let content = match response.text().await {
            Ok(content) => content,
            Err(error) => {
                return HostResult::exception(
                    &self.host,
                    HostError::Transport {
                        message: format!("failed to read response body: {}", error),
                        timed_out: error.is_timeout(),
                    },
                );
            }
        };

        if status.is_success() {
            HostResult::success(&self.host, status.as_u16(), content)
        } else {
            HostResult::failure(&self.host, status.as_u16(), content)
        }
    }
}

/// Shares one `reqwest::Client` (and its connection pool) across all adapters.
#[derive(Clone)]
pub struct HttpsAdapterFactory {
    client: Client,
    scheme: String,
    port: u16,
}

impl HttpsAdapterFactory {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            scheme: config.scheme.clone(),
            port: config.https_port,
        })
    }
}

impl AdapterFactory for HttpsAdapterFactory {
    fn create(&self, host: &str) -> Arc<dyn HostAdapter> {
        Arc::new(HttpsAdapter::new(host, &self.scheme, self.port, self.client.clone()))
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// `host:port` for the URL. Hosts that already name a port are kept as is.
fn authority(host: &str, default_port: u16) -> String {
    if host.parse::<SocketAddr>().is_ok() {
        return host.to_string();
    }
    if let Ok(v6) = host.parse::<Ipv6Addr>() {
        return format!("[{}]:{}", v6, default_port);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && port.parse::<u16>().is_ok() => host.to_string(),
        _ => format!("{}:{}", host, default_port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_authority_appends_default_port() {
        assert_eq!(authority("10.0.0.1", 8443), "10.0.0.1:8443");
        assert_eq!(authority("node-1.example", 8443), "node-1.example:8443");
        assert_eq!(authority("10.0.0.1:9000", 8443), "10.0.0.1:9000");
        assert_eq!(authority("node-1.example:9000", 8443), "node-1.example:9000");
        assert_eq!(authority("::1", 8443), "[::1]:8443");
        assert_eq!(authority("[::1]:9000", 8443), "[::1]:9000");
    }

    #[test]
    fn test_build_url_with_query_params() {
        let adapter = HttpsAdapter::new("10.0.0.1", "https", 8443, Client::new());
        let mut params = BTreeMap::new();
        params.insert("timeout".to_string(), "30".to_string());
        let request = HostRequest::new(HttpMethod::Post)
            .with_endpoint("cluster/shutdown")
            .with_query_params(params);

        let url = adapter.build_url(&request).unwrap();
        assert_eq!(url.as_str(), "https://10.0.0.1:8443/v1/cluster/shutdown?timeout=30");
    }
}
