//! Two-agent orchestration: investigation, then solution.

use chrono::Utc;
use log::info;
use std::time::{Duration, Instant};

use crate::agents::{
    GitRepositoryAnalyzer, HealthProbe, HttpHealthProbe, InvestigationAgent, RepositoryAnalyzer,
    SimulatedHealthProbe, SimulatedRepositoryAnalyzer, SolutionAgent,
};
use crate::analysis::{clamp_confidence, ComprehensiveAnalysis};
use crate::auth::Credentials;
use crate::config::{Config, ProbeMode};
use crate::error::Result;
use crate::output::PhaseProgress;
use crate::providers::jenkins::{JenkinsClient, JenkinsIntelligenceService};

const INVESTIGATION_WEIGHT: f64 = 0.6;
const SOLUTION_WEIGHT: f64 = 0.4;

pub struct TwoAgentFramework {
    investigation: InvestigationAgent,
    solution: SolutionAgent,
    show_progress: bool,
}

impl TwoAgentFramework {
    pub fn new(investigation: InvestigationAgent, solution: SolutionAgent) -> Self {
        Self {
            investigation,
            solution,
            show_progress: false,
        }
    }

    /// Builds the Jenkins client and picks live or simulated probes from
    /// `config.probes.mode`.
    pub fn from_config(config: &Config, credentials: Option<Credentials>) -> Result<Self> {
        let client = JenkinsClient::new(&config.jenkins, credentials)?;

        let (health_probe, repository_analyzer): (Box<dyn HealthProbe>, Box<dyn RepositoryAnalyzer>) =
            match config.probes.mode {
                ProbeMode::Live => (
                    Box::new(HttpHealthProbe::new(
                        config.probes.cluster_api_url.clone(),
                        Duration::from_secs(config.jenkins.timeout_secs),
                        config.jenkins.accept_invalid_certs,
                    )?),
                    Box::new(GitRepositoryAnalyzer::new(
                        config.probes.repository_url.clone(),
                        Duration::from_secs(config.probes.clone_timeout_secs),
                    )),
                ),
                ProbeMode::Simulated => (
                    Box::new(SimulatedHealthProbe),
                    Box::new(SimulatedRepositoryAnalyzer),
                ),
            };

        let investigation = InvestigationAgent::new(
            JenkinsIntelligenceService::new(client),
            health_probe,
            repository_analyzer,
        );

        Ok(Self::new(investigation, SolutionAgent::new()))
    }

    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Runs both agents against `build_url`.
    ///
    /// Never fails: unreachable Jenkins or probes only lower the confidence
    /// scores of the returned report.
    pub async fn analyze(&self, build_url: &str) -> ComprehensiveAnalysis {
        let started = Instant::now();
        info!("Analyzing build {build_url}");

        let progress = PhaseProgress::start_investigation(self.show_progress);
        let investigation = self.investigation.investigate(build_url).await;

        let progress = progress.finish_investigation_start_solution();
        let solution = self.solution.solve(&investigation);
        progress.finish_solution();

        let overall_confidence = clamp_confidence(
            INVESTIGATION_WEIGHT * investigation.confidence_score
                + SOLUTION_WEIGHT * solution.confidence_score,
        );
        let evidence_sources = investigation.evidence_sources();

        info!(
            "Build {build_url}: {} with overall confidence {overall_confidence:.2}",
            solution.bug_classification.classification
        );

        ComprehensiveAnalysis {
            build_url: build_url.to_string(),
            analyzed_at: Utc::now(),
            overall_classification: solution.bug_classification.classification,
            investigation,
            solution,
            overall_confidence,
            total_elapsed_seconds: started.elapsed().as_secs_f64(),
            evidence_sources,
        }
    }
}
