//! Second agent: turns an investigation into a classification and a fix plan.
//!
//! Everything here is a pure function of the [`InvestigationResult`], so the
//! same investigation always yields the same solution (apart from elapsed
//! time).

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::analysis::clamp_confidence;
use crate::providers::jenkins::FailureCategory;

use super::investigation::InvestigationResult;
use super::recommendations::{self, FixRecommendation, ImplementationGuidance};

const PRIMARY_INDICATOR_CONFIDENCE: f64 = 0.8;
const HEALTHY_ENVIRONMENT_THRESHOLD: f64 = 0.7;
const DEFAULT_CLASSIFICATION_CONFIDENCE: f64 = 0.5;
const STRONG_RECOMMENDATION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BugClass {
    #[serde(rename = "PRODUCT BUG")]
    ProductBug,
    #[serde(rename = "AUTOMATION BUG")]
    AutomationBug,
    #[serde(rename = "INFRASTRUCTURE BUG")]
    InfrastructureBug,
}

impl BugClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductBug => "PRODUCT BUG",
            Self::AutomationBug => "AUTOMATION BUG",
            Self::InfrastructureBug => "INFRASTRUCTURE BUG",
        }
    }
}

impl std::fmt::Display for BugClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureIndicator {
    #[serde(rename = "type")]
    pub failure_type: FailureCategory,
    pub source: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryFactor {
    pub factor: String,
    pub source: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAnalysis {
    pub primary_indicators: Vec<FailureIndicator>,
    pub secondary_factors: Vec<SecondaryFactor>,
    /// Percentage of all matches per category
    pub error_distribution: BTreeMap<FailureCategory, f64>,
    pub dominant_error_type: FailureCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugClassification {
    pub classification: BugClass,
    pub confidence: f64,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionResult {
    pub evidence_analysis: EvidenceAnalysis,
    pub bug_classification: BugClassification,
    pub fix_recommendations: Vec<FixRecommendation>,
    pub implementation_guidance: ImplementationGuidance,
    pub confidence_score: f64,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Default)]
pub struct SolutionAgent;

impl SolutionAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn solve(&self, investigation: &InvestigationResult) -> SolutionResult {
        let started = Instant::now();

        let evidence_analysis = analyze_evidence(investigation);
        let bug_classification = classify(
            &evidence_analysis,
            investigation.environment_validation.health_score,
        );
        let fix_recommendations = recommendations::recommend(
            bug_classification.classification,
            evidence_analysis.dominant_error_type,
            investigation,
        );
        let implementation_guidance = recommendations::guidance(&fix_recommendations, investigation);

        let confidence_score = solution_confidence(
            bug_classification.confidence,
            evidence_analysis.primary_indicators.len(),
            &fix_recommendations,
        );

        info!(
            "Classified as {} ({:.2}), {} recommendation(s)",
            bug_classification.classification,
            bug_classification.confidence,
            fix_recommendations.len()
        );

        SolutionResult {
            evidence_analysis,
            bug_classification,
            fix_recommendations,
            implementation_guidance,
            confidence_score,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        }
    }
}

pub fn analyze_evidence(investigation: &InvestigationResult) -> EvidenceAnalysis {
    let failure_analysis = &investigation.jenkins_intelligence.failure_analysis;

    let mut primary_indicators = Vec::new();
    if failure_analysis.primary_failure_type.is_known() {
        primary_indicators.push(FailureIndicator {
            failure_type: failure_analysis.primary_failure_type,
            source: "jenkins_console".to_string(),
            confidence: PRIMARY_INDICATOR_CONFIDENCE,
        });
    }

    let mut secondary_factors = Vec::new();
    let environment = &investigation.environment_validation;
    if !environment.environment_healthy {
        secondary_factors.push(SecondaryFactor {
            factor: "connectivity_issue".to_string(),
            source: "environment_validation".to_string(),
            detail: environment.detail.clone(),
        });
    }

    let dependencies = &investigation.repository_analysis.dependency_analysis;
    if dependencies.dependencies_valid {
        secondary_factors.push(SecondaryFactor {
            factor: "dependencies_valid".to_string(),
            source: "repository_analysis".to_string(),
            detail: dependencies.manifests.join(", "),
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let error_distribution = if failure_analysis.total_failures == 0 {
        BTreeMap::new()
    } else {
        let total = failure_analysis.total_failures as f64;
        failure_analysis
            .failure_patterns
            .iter()
            .map(|(category, matches)| (*category, matches.len() as f64 / total * 100.0))
            .collect()
    };

    EvidenceAnalysis {
        primary_indicators,
        secondary_factors,
        error_distribution,
        dominant_error_type: failure_analysis.primary_failure_type,
    }
}

struct Candidate {
    classification: BugClass,
    confidence: f64,
    reason: String,
}

fn candidate(indicator: &FailureIndicator, health_score: f64) -> Option<Candidate> {
    let failure_type = indicator.failure_type;
    match failure_type {
        FailureCategory::TimeoutErrors | FailureCategory::ElementNotFound => Some(Candidate {
            classification: BugClass::AutomationBug,
            confidence: 0.75,
            reason: format!("{failure_type} in the console log points at the test automation"),
        }),
        FailureCategory::NetworkErrors if health_score > HEALTHY_ENVIRONMENT_THRESHOLD => {
            Some(Candidate {
                classification: BugClass::ProductBug,
                confidence: 0.6,
                reason: format!(
                    "{failure_type} while the environment was healthy (score {health_score:.2}) \
                     points at the product"
                ),
            })
        }
        FailureCategory::NetworkErrors => Some(Candidate {
            classification: BugClass::InfrastructureBug,
            confidence: 0.8,
            reason: format!(
                "{failure_type} with an unhealthy environment (score {health_score:.2}) \
                 points at the infrastructure"
            ),
        }),
        _ => None,
    }
}

/// Classifies the failure from the primary indicators.
///
/// Each indicator proposes at most one candidate. The highest-confidence
/// candidate decides both label and confidence; on a tie the earlier
/// indicator wins. With no candidate the failure is an automation bug at 0.5.
pub fn classify(evidence: &EvidenceAnalysis, health_score: f64) -> BugClassification {
    let candidates: Vec<Candidate> = evidence
        .primary_indicators
        .iter()
        .filter_map(|indicator| candidate(indicator, health_score))
        .collect();

    let mut winner: Option<usize> = None;
    for (index, c) in candidates.iter().enumerate() {
        match winner {
            Some(best) if candidates[best].confidence >= c.confidence => {}
            _ => winner = Some(index),
        }
    }

    let Some(winner) = winner else {
        debug!("No decisive failure indicator, using the default classification");
        return BugClassification {
            classification: BugClass::AutomationBug,
            confidence: DEFAULT_CLASSIFICATION_CONFIDENCE,
            reasoning: vec![format!(
                "No decisive failure indicator (dominant type {}); defaulting to an automation review",
                evidence.dominant_error_type
            )],
        };
    };

    let mut reasoning = vec![candidates[winner].reason.clone()];
    reasoning.extend(
        candidates
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != winner)
            .map(|(_, c)| {
                format!(
                    "Alternative: {} ({:.2}): {}",
                    c.classification, c.confidence, c.reason
                )
            }),
    );

    BugClassification {
        classification: candidates[winner].classification,
        confidence: candidates[winner].confidence,
        reasoning,
    }
}

fn solution_confidence(
    classification_confidence: f64,
    indicator_count: usize,
    recommendations: &[FixRecommendation],
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let evidence_strength = (indicator_count as f64 * 0.2).min(0.8);

    #[allow(clippy::cast_precision_loss)]
    let strong_share = if recommendations.is_empty() {
        0.0
    } else {
        let strong = recommendations
            .iter()
            .filter(|r| r.confidence > STRONG_RECOMMENDATION)
            .count();
        strong as f64 / recommendations.len() as f64
    };

    clamp_confidence(0.4 * classification_confidence + 0.3 * evidence_strength + 0.3 * strong_share)
}
