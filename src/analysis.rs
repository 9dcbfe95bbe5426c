use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::investigation::InvestigationResult;
use crate::agents::solution::{BugClass, SolutionResult};

/// Clamps a heuristic score into `[0.0, 1.0]`. NaN counts as no evidence.
pub fn clamp_confidence(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Final report for one analyzed build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveAnalysis {
    pub build_url: String,
    pub analyzed_at: DateTime<Utc>,
    pub investigation: InvestigationResult,
    pub solution: SolutionResult,
    pub overall_classification: BugClass,
    /// 0.6 × investigation confidence + 0.4 × solution confidence
    pub overall_confidence: f64,
    pub total_elapsed_seconds: f64,
    /// Every citation gathered by both agents, duplicates removed
    pub evidence_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_confidence_bounds() {
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
        assert_eq!(clamp_confidence(1.3), 1.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(f64::INFINITY), 1.0);
    }
}
