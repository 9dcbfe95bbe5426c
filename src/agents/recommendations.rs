//! Fix recommendation templates and implementation guidance.

use serde::{Deserialize, Serialize};

use crate::providers::jenkins::FailureCategory;

use super::investigation::InvestigationResult;
use super::solution::BugClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    CodeFix,
    Escalation,
    Analysis,
    Infrastructure,
}

impl RecommendationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CodeFix => "code_fix",
            Self::Escalation => "escalation",
            Self::Analysis => "analysis",
            Self::Infrastructure => "infrastructure",
        }
    }

    pub fn estimated_time(self) -> &'static str {
        match self {
            Self::CodeFix => "2-4 hours",
            Self::Escalation => "1-2 hours",
            Self::Analysis => "4-8 hours",
            Self::Infrastructure => "1-2 hours",
        }
    }
}

/// Declaration order is urgency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixRecommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub implementation_steps: Vec<String>,
    pub file_changes: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceStep {
    pub order: usize,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub estimated_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationGuidance {
    pub ordered_steps: Vec<GuidanceStep>,
    pub prerequisites: Vec<String>,
    pub validation_steps: Vec<String>,
    pub rollback_plan: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Test files to point at, preferring what the repository scan found.
fn target_files(investigation: &InvestigationResult, fallback: &[&str]) -> Vec<String> {
    let scanned = &investigation.repository_analysis.test_files;
    if scanned.is_empty() {
        strings(fallback)
    } else {
        scanned.iter().take(3).cloned().collect()
    }
}

/// Recommendations for a classification, most specific first.
///
/// A comprehensive test suite review is always appended last.
pub fn recommend(
    classification: BugClass,
    dominant_error_type: FailureCategory,
    investigation: &InvestigationResult,
) -> Vec<FixRecommendation> {
    let mut recommendations = Vec::new();

    match (classification, dominant_error_type) {
        (BugClass::AutomationBug, FailureCategory::TimeoutErrors) => {
            recommendations.push(FixRecommendation {
                kind: RecommendationType::CodeFix,
                priority: Priority::High,
                title: "Increase timeouts and add explicit waits".to_string(),
                description: "The test gave up before the application became ready. Wait on the \
                              condition the test depends on instead of a fixed delay."
                    .to_string(),
                implementation_steps: strings(&[
                    "Raise the command timeout for the affected specs",
                    "Replace fixed sleeps with explicit waits on element visibility",
                    "Wait for the triggering API call to finish before asserting on the page",
                ]),
                file_changes: target_files(
                    investigation,
                    &["cypress.config.js", "tests/support/commands.js"],
                ),
                confidence: 0.85,
            });
        }
        (BugClass::AutomationBug, FailureCategory::ElementNotFound) => {
            recommendations.push(FixRecommendation {
                kind: RecommendationType::CodeFix,
                priority: Priority::High,
                title: "Update element selectors".to_string(),
                description: "The test looked for an element that is no longer rendered the way \
                              the selector expects."
                    .to_string(),
                implementation_steps: strings(&[
                    "Compare the failing selector with the current page markup",
                    "Switch to stable data-test attributes instead of layout-dependent selectors",
                    "Add an existence check before interacting with the element",
                ]),
                file_changes: target_files(investigation, &["tests/support/selectors.js"]),
                confidence: 0.8,
            });
        }
        (BugClass::AutomationBug, _) => {
            recommendations.push(FixRecommendation {
                kind: RecommendationType::CodeFix,
                priority: Priority::Medium,
                title: "Review test automation logic".to_string(),
                description: "No decisive failure signature was found; start from the failing \
                              test's own logic."
                    .to_string(),
                implementation_steps: strings(&[
                    "Reproduce the failure locally against the same environment",
                    "Check test data and preconditions used by the failing spec",
                    "Tighten assertions that depend on timing or ordering",
                ]),
                file_changes: target_files(investigation, &[]),
                confidence: 0.6,
            });
        }
        (BugClass::ProductBug, _) => {
            recommendations.push(FixRecommendation {
                kind: RecommendationType::Escalation,
                priority: Priority::Critical,
                title: "Escalate to the product team".to_string(),
                description: "The environment was healthy while the product failed to serve \
                              requests."
                    .to_string(),
                implementation_steps: strings(&[
                    "Create a product bug ticket with the build URL and console excerpt",
                    "Attach the failing request and environment details",
                    "Link the ticket from the failing test and mark the test as blocked",
                ]),
                file_changes: vec![],
                confidence: 0.8,
            });
        }
        (BugClass::InfrastructureBug, _) => {
            recommendations.push(FixRecommendation {
                kind: RecommendationType::Infrastructure,
                priority: Priority::High,
                title: "Restore environment connectivity".to_string(),
                description: "Network errors coincide with an unhealthy or unreachable test \
                              environment."
                    .to_string(),
                implementation_steps: strings(&[
                    "Check cluster API readiness and node status",
                    "Verify DNS records and network policies for the test environment",
                    "Re-run the build once the environment reports healthy",
                ]),
                file_changes: vec![],
                confidence: 0.75,
            });
        }
    }

    recommendations.push(FixRecommendation {
        kind: RecommendationType::Analysis,
        priority: Priority::Medium,
        title: "Comprehensive test suite review".to_string(),
        description: "Look for the same failure pattern across the rest of the suite.".to_string(),
        implementation_steps: strings(&[
            "Search recent builds of this job for the same failure signature",
            "List specs that share the failing helpers or selectors",
            "Schedule fixes for every affected spec",
        ]),
        file_changes: vec![],
        confidence: 0.9,
    });

    recommendations
}

/// Orders recommendations by priority (stable) and adds generic
/// prerequisites, validation and rollback steps.
pub fn guidance(
    recommendations: &[FixRecommendation],
    investigation: &InvestigationResult,
) -> ImplementationGuidance {
    let mut ordered: Vec<&FixRecommendation> = recommendations.iter().collect();
    ordered.sort_by_key(|r| r.priority);

    let ordered_steps = ordered
        .into_iter()
        .enumerate()
        .map(|(index, r)| GuidanceStep {
            order: index + 1,
            title: r.title.clone(),
            kind: r.kind,
            priority: r.priority,
            estimated_time: r.kind.estimated_time().to_string(),
        })
        .collect();

    let checkout = investigation
        .jenkins_intelligence
        .environment
        .branch
        .as_ref()
        .map_or_else(
            || "A local checkout of the test repository".to_string(),
            |branch| format!("A local checkout of the test repository at branch {branch}"),
        );

    ImplementationGuidance {
        ordered_steps,
        prerequisites: vec![
            "Access to the failing Jenkins build and its console log".to_string(),
            checkout,
            "Access to the target test environment".to_string(),
        ],
        validation_steps: strings(&[
            "Re-run the failing job against the same environment",
            "Confirm the primary failure signature no longer appears in the console log",
            "Run the affected suite three times to rule out flakiness",
        ]),
        rollback_plan: strings(&[
            "Revert the change with git revert",
            "Restore the previous test configuration values",
            "Re-run the suite to confirm the previous baseline is back",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::solution::tests::investigation_with;

    #[test]
    fn test_review_is_always_last() {
        let investigation = investigation_with("", 0.0);
        for class in [BugClass::AutomationBug, BugClass::ProductBug, BugClass::InfrastructureBug] {
            let recommendations = recommend(class, FailureCategory::Unknown, &investigation);
            let last = recommendations.last().unwrap();
            assert_eq!(last.kind, RecommendationType::Analysis);
            assert_eq!(last.title, "Comprehensive test suite review");
            assert_eq!(last.confidence, 0.9);
        }
    }

    #[test]
    fn test_timeout_template_is_code_fix() {
        let investigation = investigation_with("TimeoutError", 0.0);
        let recommendations =
            recommend(BugClass::AutomationBug, FailureCategory::TimeoutErrors, &investigation);
        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0].kind, RecommendationType::CodeFix);
        assert!(recommendations[0].title.contains("timeouts"));
        assert!(!recommendations[0].file_changes.is_empty());
    }

    #[test]
    fn test_product_bug_escalates() {
        let investigation = investigation_with("connection refused", 0.9);
        let recommendations =
            recommend(BugClass::ProductBug, FailureCategory::NetworkErrors, &investigation);
        assert_eq!(recommendations[0].kind, RecommendationType::Escalation);
        assert_eq!(recommendations[0].priority, Priority::Critical);
    }

    #[test]
    fn test_guidance_orders_by_priority() {
        let investigation = investigation_with("connection refused", 0.9);
        let mut recommendations =
            recommend(BugClass::ProductBug, FailureCategory::NetworkErrors, &investigation);
        // Put the medium-priority review first to check reordering.
        recommendations.reverse();

        let guidance = guidance(&recommendations, &investigation);
        let priorities: Vec<Priority> = guidance.ordered_steps.iter().map(|s| s.priority).collect();
        assert_eq!(priorities, vec![Priority::Critical, Priority::Medium]);
        assert_eq!(guidance.ordered_steps[0].order, 1);
        assert_eq!(guidance.ordered_steps[0].estimated_time, "1-2 hours");
        assert_eq!(guidance.ordered_steps[1].estimated_time, "4-8 hours");
        assert!(guidance.rollback_plan[0].contains("git revert"));
    }

    #[test]
    fn test_estimated_time_lookup() {
        assert_eq!(RecommendationType::CodeFix.estimated_time(), "2-4 hours");
        assert_eq!(RecommendationType::Escalation.estimated_time(), "1-2 hours");
        assert_eq!(RecommendationType::Analysis.estimated_time(), "4-8 hours");
        assert_eq!(RecommendationType::Infrastructure.estimated_time(), "1-2 hours");
    }

    #[test]
    fn test_recommendation_type_serializes_as_type_field() {
        let investigation = investigation_with("", 0.0);
        let recommendations = recommend(BugClass::AutomationBug, FailureCategory::Unknown, &investigation);
        let json = serde_json::to_value(&recommendations[0]).unwrap();
        assert_eq!(json["type"], "code_fix");
        assert_eq!(json["priority"], "medium");
    }
}
