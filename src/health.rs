//! Health probing.
//!
//! Probes each endpoint once, sequentially, with a fixed timeout. A failed
//! probe is data in the aggregate report, never an error; the orchestrator
//! decides what to do with unhealthy entries.

use std::time::Duration;
use tracing::{debug, info};

use crate::config::{HealthEndpoint, RunConfig};
use crate::types::HealthCheckResult;

pub struct HealthProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HealthProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Probe every endpoint once, in order. Always returns exactly one
    /// result per requested endpoint.
    pub async fn probe_all(&self, endpoints: &[HealthEndpoint]) -> Vec<HealthCheckResult> {
        let mut results = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            results.push(self.probe(endpoint).await);
        }
        let healthy = results.iter().filter(|r| r.healthy).count();
        info!("Health: {}/{} endpoints healthy", healthy, results.len());
        results
    }

    async fn probe(&self, endpoint: &HealthEndpoint) -> HealthCheckResult {
        debug!("Probing {} ({})", endpoint.name, endpoint.url);
        match self
            .client
            .get(&endpoint.url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                HealthCheckResult {
                    name: endpoint.name.clone(),
                    url: endpoint.url.clone(),
                    healthy: status.is_success(),
                    detail: if status.is_success() {
                        None
                    } else {
                        Some(format!("HTTP {}", status.as_u16()))
                    },
                }
            }
            Err(err) => HealthCheckResult {
                name: endpoint.name.clone(),
                url: endpoint.url.clone(),
                healthy: false,
                detail: Some(if err.is_timeout() {
                    "timed out".to_string()
                } else {
                    err.to_string()
                }),
            },
        }
    }
}

/// Default endpoint set for a deployed workspace: the backend's own health
/// route and the frontend root, plus proxy-fronted variants when the reverse
/// proxy is enabled.
pub fn default_endpoints(config: &RunConfig) -> Vec<HealthEndpoint> {
    let mut endpoints = vec![
        HealthEndpoint {
            name: "backend".to_string(),
            url: format!(
                "{}/api/health",
                config.proxy.backend_upstream.trim_end_matches('/')
            ),
        },
        HealthEndpoint {
            name: "frontend".to_string(),
            url: format!(
                "{}/",
                config.proxy.frontend_upstream.trim_end_matches('/')
            ),
        },
    ];

    if config.flags.enable_reverse_proxy {
        let host = config
            .proxy
            .server_names
            .first()
            .map(String::as_str)
            .unwrap_or("localhost");
        let base = format!("http://{}:{}", host, config.proxy.listen_port);
        endpoints.push(HealthEndpoint {
            name: "proxy".to_string(),
            url: format!("{base}/health"),
        });
        endpoints.push(HealthEndpoint {
            name: "proxied backend".to_string(),
            url: format!("{base}/api/health"),
        });
    }

    endpoints.extend(config.health.endpoints.iter().cloned());
    endpoints
}
