//! Environment health probes.
//!
//! The investigation agent only sees the [`HealthProbe`] trait. The live
//! probe calls the cluster API; the simulated one returns a fixed healthy
//! record and labels it as simulated so it is never mistaken for a real
//! signal.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::{Result, TriageError};

/// Health score when the simulated probe is in use.
pub const SIMULATED_HEALTH_SCORE: f64 = 0.85;

const FAST_RESPONSE: Duration = Duration::from_millis(500);
const SLOW_RESPONSE: Duration = Duration::from_secs(2);
const UNHEALTHY_RESPONSE_SCORE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Live,
    Simulated,
}

impl ProbeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Simulated => "simulated",
        }
    }
}

/// Outcome of checking the environment a build ran against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentValidation {
    pub cluster_name: Option<String>,
    pub cluster_connectivity: bool,
    pub api_accessible: bool,
    pub environment_healthy: bool,
    pub health_score: f64,
    /// Which probe produced this record; `None` when no check ran
    pub probe: Option<ProbeKind>,
    pub latency_ms: Option<u64>,
    pub detail: String,
}

impl EnvironmentValidation {
    /// Record for a build that named no cluster.
    pub fn skipped(detail: &str) -> Self {
        Self {
            cluster_name: None,
            cluster_connectivity: false,
            api_accessible: false,
            environment_healthy: false,
            health_score: 0.0,
            probe: None,
            latency_ms: None,
            detail: detail.to_string(),
        }
    }

    /// Record for a named cluster that could not be probed because no
    /// request target exists. Counts as not checked.
    fn not_run(cluster_name: &str, detail: String) -> Self {
        Self {
            cluster_name: Some(cluster_name.to_string()),
            ..Self::skipped(&detail)
        }
    }

    fn unreachable(cluster_name: &str, detail: String) -> Self {
        Self {
            cluster_name: Some(cluster_name.to_string()),
            cluster_connectivity: false,
            api_accessible: false,
            environment_healthy: false,
            health_score: 0.0,
            probe: Some(ProbeKind::Live),
            latency_ms: None,
            detail,
        }
    }

    pub fn was_checked(&self) -> bool {
        self.probe.is_some()
    }
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    async fn check(&self, cluster_name: &str) -> EnvironmentValidation;
}

/// Fixed healthy result for fixtures and offline runs.
pub struct SimulatedHealthProbe;

#[async_trait]
impl HealthProbe for SimulatedHealthProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Simulated
    }

    async fn check(&self, cluster_name: &str) -> EnvironmentValidation {
        EnvironmentValidation {
            cluster_name: Some(cluster_name.to_string()),
            cluster_connectivity: true,
            api_accessible: true,
            environment_healthy: true,
            health_score: SIMULATED_HEALTH_SCORE,
            probe: Some(ProbeKind::Simulated),
            latency_ms: None,
            detail: "simulated health check, no request was made".to_string(),
        }
    }
}

/// Probes `<cluster-api-url>/readyz` over HTTP.
///
/// The URL template may contain `{cluster}`, which is replaced by the
/// cluster name taken from the build parameters.
pub struct HttpHealthProbe {
    client: Client,
    url_template: Option<String>,
}

impl HttpHealthProbe {
    pub fn new(url_template: Option<String>, timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("triagelens/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| TriageError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url_template,
        })
    }

    fn readyz_url(template: &str, cluster_name: &str) -> Result<url::Url> {
        let base = template.replace("{cluster}", cluster_name);
        url::Url::parse(&format!("{}/readyz", base.trim_end_matches('/')))
            .map_err(|e| TriageError::Config(format!("Invalid cluster API URL '{base}': {e}")))
    }
}

/// Score for a successful readiness response, by latency.
fn latency_score(latency: Duration) -> f64 {
    if latency < FAST_RESPONSE {
        1.0
    } else if latency < SLOW_RESPONSE {
        0.85
    } else {
        0.7
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Live
    }

    async fn check(&self, cluster_name: &str) -> EnvironmentValidation {
        let Some(template) = &self.url_template else {
            debug!("No cluster API URL configured, skipping health check for {cluster_name}");
            return EnvironmentValidation::not_run(
                cluster_name,
                "no cluster API URL configured".to_string(),
            );
        };

        let url = match Self::readyz_url(template, cluster_name) {
            Ok(url) => url,
            Err(e) => {
                warn!("{e}");
                return EnvironmentValidation::not_run(cluster_name, e.to_string());
            }
        };

        let started = Instant::now();
        let response = self.client.get(url.clone()).send().await;
        let latency = started.elapsed();

        #[allow(clippy::cast_possible_truncation)]
        let latency_ms = Some(latency.as_millis() as u64);

        match response {
            Ok(response) if response.status().is_success() => EnvironmentValidation {
                cluster_name: Some(cluster_name.to_string()),
                cluster_connectivity: true,
                api_accessible: true,
                environment_healthy: true,
                health_score: latency_score(latency),
                probe: Some(ProbeKind::Live),
                latency_ms,
                detail: format!("{url} answered {}", response.status()),
            },
            Ok(response) => {
                warn!("Cluster {cluster_name} readiness check returned {}", response.status());
                EnvironmentValidation {
                    cluster_name: Some(cluster_name.to_string()),
                    cluster_connectivity: true,
                    api_accessible: true,
                    environment_healthy: false,
                    health_score: UNHEALTHY_RESPONSE_SCORE,
                    probe: Some(ProbeKind::Live),
                    latency_ms,
                    detail: format!("{url} answered {}", response.status()),
                }
            }
            Err(e) => {
                warn!("Cluster {cluster_name} is unreachable: {e}");
                EnvironmentValidation::unreachable(cluster_name, format!("{url} unreachable: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(template: Option<String>) -> HttpHealthProbe {
        HttpHealthProbe::new(template, Duration::from_secs(5), false).unwrap()
    }

    #[tokio::test]
    async fn test_simulated_probe_is_labelled() {
        let validation = SimulatedHealthProbe.check("qe6").await;
        assert_eq!(validation.probe, Some(ProbeKind::Simulated));
        assert_eq!(validation.health_score, SIMULATED_HEALTH_SCORE);
        assert!(validation.environment_healthy);
        assert_eq!(validation.cluster_name.as_deref(), Some("qe6"));
    }

    #[tokio::test]
    async fn test_live_probe_without_template_is_not_a_check() {
        let validation = probe(None).check("qe6").await;
        assert!(!validation.was_checked());
        assert_eq!(validation.cluster_name.as_deref(), Some("qe6"));
        assert_eq!(validation.health_score, 0.0);
        assert!(!validation.cluster_connectivity);
    }

    #[tokio::test]
    async fn test_live_probe_healthy_cluster() {
        let mut server = mockito::Server::new_async().await;
        let readyz = server
            .mock("GET", "/clusters/qe6/readyz")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let template = format!("{}/clusters/{{cluster}}/", server.url());
        let validation = probe(Some(template)).check("qe6").await;

        readyz.assert_async().await;
        assert!(validation.cluster_connectivity);
        assert!(validation.environment_healthy);
        assert!(validation.health_score > 0.7);
        assert!(validation.latency_ms.is_some());
    }

    #[tokio::test]
    async fn test_live_probe_unhealthy_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/readyz")
            .with_status(503)
            .create_async()
            .await;

        let validation = probe(Some(server.url())).check("qe6").await;
        assert!(validation.cluster_connectivity);
        assert!(!validation.environment_healthy);
        assert_eq!(validation.health_score, UNHEALTHY_RESPONSE_SCORE);
    }

    #[tokio::test]
    async fn test_live_probe_unreachable_cluster() {
        let validation = probe(Some("http://127.0.0.1:1".to_string())).check("qe6").await;
        assert!(validation.was_checked());
        assert!(!validation.cluster_connectivity);
        assert_eq!(validation.health_score, 0.0);
    }

    #[tokio::test]
    async fn test_live_probe_invalid_template() {
        let validation = probe(Some("not a url {cluster}".to_string())).check("qe6").await;
        assert!(!validation.was_checked());
        assert_eq!(validation.health_score, 0.0);
        assert!(validation.detail.contains("Invalid cluster API URL"));
    }

    #[test]
    fn test_latency_score_thresholds() {
        assert_eq!(latency_score(Duration::from_millis(20)), 1.0);
        assert_eq!(latency_score(Duration::from_millis(900)), 0.85);
        assert_eq!(latency_score(Duration::from_secs(3)), 0.7);
    }

    #[test]
    fn test_skipped_validation() {
        let validation = EnvironmentValidation::skipped("no cluster name in build parameters");
        assert!(!validation.was_checked());
        assert_eq!(validation.health_score, 0.0);
    }
}
