use indexmap::IndexMap;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::analysis::clamp_confidence;

use super::citations::{build_citation, console_citation, repository_citation};
use super::client::JenkinsClient;
use super::patterns::FailureAnalysis;
use super::types::BuildMetadata;

const CLUSTER_KEYS: &[&str] = &["CLUSTER_NAME", "cluster", "environment", "ENVIRONMENT"];
const ENVIRONMENT_TYPE_KEYS: &[&str] = &["ENVIRONMENT_TYPE", "ENV_TYPE", "environment_type", "TARGET_ENV"];
const BRANCH_KEYS: &[&str] = &["GIT_BRANCH", "BRANCH", "branch", "BRANCH_NAME"];
const TEST_SUITE_KEYS: &[&str] = &["TEST_SUITE", "test_suite", "SUITE", "TEST_TAGS"];
const REPOSITORY_KEYS: &[&str] = &["GIT_URL", "REPO_URL", "GIT_REPO", "repository"];

// Evidence-completeness weights; they sum to 1.0.
const RESULT_KNOWN_WEIGHT: f64 = 0.3;
const CONSOLE_PRESENT_WEIGHT: f64 = 0.2;
const FAILURES_DETECTED_WEIGHT: f64 = 0.3;
const PARAMETERS_PRESENT_WEIGHT: f64 = 0.1;
const BRANCH_PRESENT_WEIGHT: f64 = 0.05;
const COMMIT_PRESENT_WEIGHT: f64 = 0.05;

static COMMIT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bcommit\s+([0-9a-f]{7,40})\b").expect("valid commit pattern"),
        Regex::new(r"(?i)\bRevision:?\s+([0-9a-f]{7,40})\b").expect("valid commit pattern"),
        Regex::new(r"(?i)Checking out (?:Revision\s+)?([0-9a-f]{7,40})\b").expect("valid commit pattern"),
    ]
});

/// Environment details pulled from build parameters and the console log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub cluster_name: Option<String>,
    pub environment_type: Option<String>,
    /// Branch with any `origin/` prefix removed
    pub branch: Option<String>,
    pub test_suite: Option<String>,
    pub commit_sha: Option<String>,
    pub repository_url: Option<String>,
}

/// Everything known about a build after the Jenkins stage.
///
/// This is the unit handed from the metadata stage to the agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JenkinsIntelligence {
    pub metadata: BuildMetadata,
    pub failure_analysis: FailureAnalysis,
    pub environment: EnvironmentInfo,
    pub evidence_sources: Vec<String>,
    pub confidence_score: f64,
}

impl JenkinsIntelligence {
    /// Derives failure analysis, environment info, citations and confidence
    /// from already-fetched metadata. Pure; performs no I/O.
    pub fn from_metadata(metadata: BuildMetadata) -> Self {
        let failure_analysis = FailureAnalysis::analyze(&metadata.console_log_snippet);
        let environment = extract_environment(&metadata);

        let mut evidence_sources = vec![build_citation(&metadata), console_citation(&metadata)];
        if let (Some(branch), Some(commit)) = (&environment.branch, &environment.commit_sha) {
            evidence_sources.push(repository_citation(
                branch,
                commit,
                environment.repository_url.as_deref(),
            ));
        }

        let confidence_score = confidence(&metadata, &failure_analysis, &environment);

        debug!(
            "Primary failure type {} ({} matches), confidence {confidence_score:.2}",
            failure_analysis.primary_failure_type, failure_analysis.total_failures
        );

        Self {
            metadata,
            failure_analysis,
            environment,
            evidence_sources,
            confidence_score,
        }
    }
}

/// Fetches a build and turns it into [`JenkinsIntelligence`].
pub struct JenkinsIntelligenceService {
    client: JenkinsClient,
}

impl JenkinsIntelligenceService {
    pub fn new(client: JenkinsClient) -> Self {
        Self { client }
    }

    pub async fn analyze_build(&self, build_url: &str) -> JenkinsIntelligence {
        let metadata = self.client.fetch_build(build_url).await;
        let intelligence = JenkinsIntelligence::from_metadata(metadata);
        info!(
            "Jenkins intelligence for {} #{}: {} failure(s), confidence {:.2}",
            intelligence.metadata.job_name,
            intelligence.metadata.build_number,
            intelligence.failure_analysis.total_failures,
            intelligence.confidence_score
        );
        intelligence
    }
}

fn confidence(
    metadata: &BuildMetadata,
    failure_analysis: &FailureAnalysis,
    environment: &EnvironmentInfo,
) -> f64 {
    let signals = [
        (metadata.result.is_known(), RESULT_KNOWN_WEIGHT),
        (!metadata.console_log_snippet.is_empty(), CONSOLE_PRESENT_WEIGHT),
        (failure_analysis.has_failures(), FAILURES_DETECTED_WEIGHT),
        (!metadata.parameters.is_empty(), PARAMETERS_PRESENT_WEIGHT),
        (environment.branch.is_some(), BRANCH_PRESENT_WEIGHT),
        (environment.commit_sha.is_some(), COMMIT_PRESENT_WEIGHT),
    ];

    clamp_confidence(
        signals
            .iter()
            .filter(|(present, _)| *present)
            .map(|(_, weight)| weight)
            .sum(),
    )
}

fn extract_environment(metadata: &BuildMetadata) -> EnvironmentInfo {
    let parameters = &metadata.parameters;

    let branch = first_parameter(parameters, BRANCH_KEYS)
        .or_else(|| metadata.branch.clone())
        .map(|b| strip_origin(&b));

    let commit_sha = commit_from_console(&metadata.console_log_snippet)
        .or_else(|| metadata.commit_hash.clone());

    EnvironmentInfo {
        cluster_name: first_parameter(parameters, CLUSTER_KEYS),
        environment_type: first_parameter(parameters, ENVIRONMENT_TYPE_KEYS),
        branch,
        test_suite: first_parameter(parameters, TEST_SUITE_KEYS),
        commit_sha,
        repository_url: first_parameter(parameters, REPOSITORY_KEYS),
    }
}

/// Value of the first alias present with a non-empty value, in listed order.
fn first_parameter(parameters: &IndexMap<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| parameters.get(*key))
        .find_map(parameter_text)
}

fn parameter_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn strip_origin(branch: &str) -> String {
    branch.strip_prefix("origin/").unwrap_or(branch).to_string()
}

fn commit_from_console(console: &str) -> Option<String> {
    COMMIT_PATTERNS.iter().find_map(|re| {
        re.captures(console)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}
