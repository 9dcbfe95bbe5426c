use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::analysis::clamp_confidence;
use crate::providers::jenkins::citations::{environment_citation, repository_citation};
use crate::providers::jenkins::{JenkinsIntelligence, JenkinsIntelligenceService};

use super::probes::{EnvironmentValidation, HealthProbe, ProbeKind};
use super::repository::{RepositoryAnalysis, RepositoryAnalyzer, RepositoryRequest};

const JENKINS_WEIGHT: f64 = 0.4;
const ENVIRONMENT_WEIGHT: f64 = 0.3;
const REPOSITORY_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyCheck {
    pub name: String,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfidence {
    pub jenkins: f64,
    pub environment: f64,
    pub repository: f64,
}

/// How well the independent sources agree with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceCorrelation {
    /// Only the checks that applied to this build
    pub consistency_checks: Vec<ConsistencyCheck>,
    /// Passed checks over applicable checks; 0.0 when none applied
    pub correlation_score: f64,
    pub source_confidence: SourceConfidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationResult {
    pub jenkins_intelligence: JenkinsIntelligence,
    pub environment_validation: EnvironmentValidation,
    pub repository_analysis: RepositoryAnalysis,
    pub evidence_correlation: EvidenceCorrelation,
    pub confidence_score: f64,
    pub elapsed_seconds: f64,
}

impl InvestigationResult {
    /// Jenkins citations followed by environment and repository citations,
    /// without duplicates.
    pub fn evidence_sources(&self) -> Vec<String> {
        let mut sources = self.jenkins_intelligence.evidence_sources.clone();

        let environment = &self.environment_validation;
        if let (Some(cluster), Some(probe)) = (&environment.cluster_name, environment.probe) {
            sources.push(environment_citation(cluster, probe.as_str()));
        }

        let repository = &self.repository_analysis;
        if repository.repository_cloned {
            if let (Some(branch), Some(commit)) = (&repository.branch, &repository.commit_sha) {
                sources.push(repository_citation(
                    branch,
                    commit,
                    repository.repository_url.as_deref(),
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        sources.retain(|source| seen.insert(source.clone()));
        sources
    }
}

/// First agent: gathers and cross-checks evidence about a failed build.
pub struct InvestigationAgent {
    intelligence: JenkinsIntelligenceService,
    health_probe: Box<dyn HealthProbe>,
    repository_analyzer: Box<dyn RepositoryAnalyzer>,
}

impl InvestigationAgent {
    pub fn new(
        intelligence: JenkinsIntelligenceService,
        health_probe: Box<dyn HealthProbe>,
        repository_analyzer: Box<dyn RepositoryAnalyzer>,
    ) -> Self {
        if health_probe.kind() == ProbeKind::Simulated {
            warn!("Environment health checks are simulated; their scores are not live signals");
        }
        if repository_analyzer.kind() == ProbeKind::Simulated {
            warn!("Repository analysis is simulated; no repository will be cloned");
        }

        Self {
            intelligence,
            health_probe,
            repository_analyzer,
        }
    }

    /// Fetches the build and runs the full investigation.
    pub async fn investigate(&self, build_url: &str) -> InvestigationResult {
        let started = Instant::now();
        let intelligence = self.intelligence.analyze_build(build_url).await;
        self.complete(intelligence, started).await
    }

    /// Runs the investigation on already-gathered Jenkins intelligence.
    pub async fn investigate_intelligence(&self, intelligence: JenkinsIntelligence) -> InvestigationResult {
        self.complete(intelligence, Instant::now()).await
    }

    async fn complete(&self, intelligence: JenkinsIntelligence, started: Instant) -> InvestigationResult {
        let environment = &intelligence.environment;

        let environment_validation = match &environment.cluster_name {
            Some(cluster) => self.health_probe.check(cluster).await,
            None => EnvironmentValidation::skipped("no cluster name in build parameters"),
        };

        let repository_analysis = match &environment.branch {
            Some(branch) => {
                let request = RepositoryRequest {
                    branch: branch.clone(),
                    commit_sha: environment.commit_sha.clone(),
                    repository_url: environment.repository_url.clone(),
                };
                self.repository_analyzer.analyze(&request).await
            }
            None => RepositoryAnalysis::skipped("no branch in build parameters"),
        };

        let evidence_correlation =
            correlate(&intelligence, &environment_validation, &repository_analysis);

        let confidence_score = investigation_confidence(
            intelligence.confidence_score,
            &environment_validation,
            &repository_analysis,
        );

        info!(
            "Investigation finished: confidence {confidence_score:.2}, correlation {:.2}",
            evidence_correlation.correlation_score
        );

        InvestigationResult {
            jenkins_intelligence: intelligence,
            environment_validation,
            repository_analysis,
            evidence_correlation,
            confidence_score,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        }
    }
}

fn repository_score(repository: &RepositoryAnalysis) -> f64 {
    if repository.repository_cloned {
        1.0
    } else {
        0.0
    }
}

fn investigation_confidence(
    jenkins_confidence: f64,
    environment: &EnvironmentValidation,
    repository: &RepositoryAnalysis,
) -> f64 {
    clamp_confidence(
        JENKINS_WEIGHT * jenkins_confidence
            + ENVIRONMENT_WEIGHT * environment.health_score
            + REPOSITORY_WEIGHT * repository_score(repository),
    )
}

/// Commits match when one name abbreviates the other.
fn same_commit(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_ascii_lowercase(), b.to_ascii_lowercase());
    a.starts_with(&b) || b.starts_with(&a)
}

pub(crate) fn correlate(
    intelligence: &JenkinsIntelligence,
    environment: &EnvironmentValidation,
    repository: &RepositoryAnalysis,
) -> EvidenceCorrelation {
    let mut consistency_checks = Vec::new();

    if environment.was_checked() {
        consistency_checks.push(ConsistencyCheck {
            name: "jenkins_environment_match".to_string(),
            passed: environment.cluster_name == intelligence.environment.cluster_name,
        });
    }

    if repository.repository_cloned {
        consistency_checks.push(ConsistencyCheck {
            name: "jenkins_repository_branch_match".to_string(),
            passed: repository.branch == intelligence.environment.branch,
        });

        let built_commit = &intelligence.environment.commit_sha;
        if let (Some(scanned), Some(built)) = (&repository.commit_sha, built_commit) {
            consistency_checks.push(ConsistencyCheck {
                name: "jenkins_repository_commit_match".to_string(),
                passed: same_commit(scanned, built),
            });
        }
    }

    let passed = consistency_checks.iter().filter(|c| c.passed).count();
    #[allow(clippy::cast_precision_loss)]
    let correlation_score = if consistency_checks.is_empty() {
        0.0
    } else {
        passed as f64 / consistency_checks.len() as f64
    };

    EvidenceCorrelation {
        consistency_checks,
        correlation_score: clamp_confidence(correlation_score),
        source_confidence: SourceConfidence {
            jenkins: intelligence.confidence_score,
            environment: environment.health_score,
            repository: repository_score(repository),
        },
    }
}
