//! Console-log failure signatures.
//!
//! Scans the retained console snippet against a fixed table of
//! case-insensitive patterns and names the dominant failure category.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Failure categories, declared in alphabetical order so that `Ord` is the
/// tie-break order when two categories have the same number of matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    AssertionFailures,
    BuildFailures,
    ElementNotFound,
    EnvironmentIssues,
    NetworkErrors,
    TimeoutErrors,
    /// No category matched. Only ever used as a primary failure type.
    Unknown,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AssertionFailures => "assertion_failures",
            Self::BuildFailures => "build_failures",
            Self::ElementNotFound => "element_not_found",
            Self::EnvironmentIssues => "environment_issues",
            Self::NetworkErrors => "network_errors",
            Self::TimeoutErrors => "timeout_errors",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("valid failure pattern"))
        .collect()
}

static PATTERN_TABLE: LazyLock<Vec<(FailureCategory, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            FailureCategory::AssertionFailures,
            compile(&[
                r"assertion\s*error",
                r"assertion\s+failed",
                r"expected\s+\S+\s+to\s+(?:equal|be|contain|have|include)\b",
            ]),
        ),
        (
            FailureCategory::BuildFailures,
            compile(&[
                r"build\s+failed",
                r"compilation\s+(?:error|failed)",
                r"npm\s+err!",
                r"cannot\s+find\s+module",
                r"exit\s+code\s+[1-9]\d*",
            ]),
        ),
        (
            FailureCategory::ElementNotFound,
            compile(&[
                r"element\s+not\s+found",
                r"no\s+such\s+element",
                r"unable\s+to\s+locate\s+element",
                r"could\s+not\s+find\s+element",
                r"expected\s+to\s+find\s+element",
                r"element\s+(?:is\s+)?not\s+(?:visible|interactable|attached)",
            ]),
        ),
        (
            FailureCategory::EnvironmentIssues,
            compile(&[
                r"no\s+space\s+left\s+on\s+device",
                r"out\s+of\s+memory",
                r"oomkilled",
                r"permission\s+denied",
                r"command\s+not\s+found",
                r"(?:cluster|node)\s+(?:is\s+)?(?:unavailable|unreachable|not\s+ready)",
            ]),
        ),
        (
            FailureCategory::NetworkErrors,
            compile(&[
                r"connection\s+refused",
                r"connection\s+reset",
                r"econn(?:refused|reset)",
                r"network\s+(?:error|is\s+unreachable)",
                r"no\s+route\s+to\s+host",
                r"getaddrinfo\s+\w+",
                r"(?:dns|name)\s+resolution\s+failed",
                r"ssl\s+handshake\s+failed",
            ]),
        ),
        (
            FailureCategory::TimeoutErrors,
            compile(&[r"\w*timeout\w*", r"timed\s+out", r"deadline\s+exceeded"]),
        ),
    ]
});

/// Failure signatures found in one console log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureAnalysis {
    /// Matched substrings per category; categories without matches are omitted
    pub failure_patterns: BTreeMap<FailureCategory, Vec<String>>,
    pub total_failures: usize,
    pub primary_failure_type: FailureCategory,
}

impl Default for FailureAnalysis {
    fn default() -> Self {
        Self {
            failure_patterns: BTreeMap::new(),
            total_failures: 0,
            primary_failure_type: FailureCategory::Unknown,
        }
    }
}

impl FailureAnalysis {
    /// Runs every pattern of every category over `console_log`.
    ///
    /// The primary failure type is the category with the most matches. Ties
    /// go to the alphabetically first category name; no matches at all
    /// yields [`FailureCategory::Unknown`].
    pub fn analyze(console_log: &str) -> Self {
        let mut failure_patterns = BTreeMap::new();

        for (category, patterns) in PATTERN_TABLE.iter() {
            let matches: Vec<String> = patterns
                .iter()
                .flat_map(|re| re.find_iter(console_log).map(|m| m.as_str().to_string()))
                .collect();

            if !matches.is_empty() {
                debug!("{category}: {} match(es)", matches.len());
                failure_patterns.insert(*category, matches);
            }
        }

        let total_failures = failure_patterns.values().map(Vec::len).sum();
        let primary_failure_type = primary_category(&failure_patterns);

        Self {
            failure_patterns,
            total_failures,
            primary_failure_type,
        }
    }

    pub fn count(&self, category: FailureCategory) -> usize {
        self.failure_patterns.get(&category).map_or(0, Vec::len)
    }

    pub fn has_failures(&self) -> bool {
        self.total_failures > 0
    }
}

fn primary_category(failure_patterns: &BTreeMap<FailureCategory, Vec<String>>) -> FailureCategory {
    // BTreeMap iterates in category order; strict `>` keeps the first of equals.
    let mut primary = FailureCategory::Unknown;
    let mut best = 0;
    for (category, matches) in failure_patterns {
        if matches.len() > best {
            best = matches.len();
            primary = *category;
        }
    }
    primary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log_is_unknown() {
        let analysis = FailureAnalysis::analyze("");
        assert_eq!(analysis.primary_failure_type, FailureCategory::Unknown);
        assert_eq!(analysis.total_failures, 0);
        assert!(analysis.failure_patterns.is_empty());
    }

    #[test]
    fn test_clean_log_is_unknown() {
        let log = "Started by user admin\nRunning tests\n42 passing\nFinished: SUCCESS\n";
        let analysis = FailureAnalysis::analyze(log);
        assert_eq!(analysis.primary_failure_type, FailureCategory::Unknown);
        assert!(!analysis.has_failures());
    }

    #[test]
    fn test_timeout_error_is_primary() {
        let analysis = FailureAnalysis::analyze("TimeoutError: waiting for element");
        assert_eq!(analysis.primary_failure_type, FailureCategory::TimeoutErrors);
        assert_eq!(
            analysis.failure_patterns[&FailureCategory::TimeoutErrors],
            vec!["TimeoutError".to_string()]
        );
        assert_eq!(analysis.count(FailureCategory::ElementNotFound), 0);
        assert_eq!(analysis.total_failures, 1);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let analysis = FailureAnalysis::analyze("CONNECTION REFUSED by upstream");
        assert_eq!(analysis.primary_failure_type, FailureCategory::NetworkErrors);
        assert_eq!(
            analysis.failure_patterns[&FailureCategory::NetworkErrors],
            vec!["CONNECTION REFUSED".to_string()]
        );
    }

    #[test]
    fn test_category_with_most_matches_wins() {
        let log = "connection refused\nECONNRESET\nno route to host\nTimed out waiting\n";
        let analysis = FailureAnalysis::analyze(log);
        assert_eq!(analysis.count(FailureCategory::NetworkErrors), 3);
        assert_eq!(analysis.count(FailureCategory::TimeoutErrors), 1);
        assert_eq!(analysis.primary_failure_type, FailureCategory::NetworkErrors);
        assert_eq!(analysis.total_failures, 4);
    }

    #[test]
    fn test_ties_break_alphabetically() {
        // One network match and one timeout match: network_errors < timeout_errors.
        let analysis = FailureAnalysis::analyze("connection refused; request timeout");
        assert_eq!(analysis.count(FailureCategory::NetworkErrors), 1);
        assert_eq!(analysis.count(FailureCategory::TimeoutErrors), 1);
        assert_eq!(analysis.primary_failure_type, FailureCategory::NetworkErrors);

        // element_not_found sorts before timeout_errors as well.
        let analysis = FailureAnalysis::analyze("no such element: #submit\nrequest timeout");
        assert_eq!(analysis.primary_failure_type, FailureCategory::ElementNotFound);
    }

    #[test]
    fn test_element_not_found_patterns() {
        let log = "NoSuchElementError: no such element\nUnable to locate element: {\"css\":\"#login\"}";
        let analysis = FailureAnalysis::analyze(log);
        assert_eq!(analysis.count(FailureCategory::ElementNotFound), 2);
        assert_eq!(analysis.primary_failure_type, FailureCategory::ElementNotFound);
    }

    #[test]
    fn test_all_matches_are_collected() {
        let log = "timeout 1\ntimeout 2\ntimeout 3";
        let analysis = FailureAnalysis::analyze(log);
        assert_eq!(analysis.count(FailureCategory::TimeoutErrors), 3);
    }

    #[test]
    fn test_unmatched_categories_are_omitted() {
        let analysis = FailureAnalysis::analyze("AssertionError: expected 3 to equal 4");
        assert_eq!(analysis.failure_patterns.len(), 1);
        assert_eq!(analysis.count(FailureCategory::AssertionFailures), 2);
    }

    #[test]
    fn test_categories_serialize_as_snake_case_keys() {
        let analysis = FailureAnalysis::analyze("connection refused");
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["primary_failure_type"], "network_errors");
        assert!(json["failure_patterns"]["network_errors"].is_array());
    }

    #[test]
    fn test_category_order_is_alphabetical() {
        let mut names: Vec<&str> = PATTERN_TABLE.iter().map(|(c, _)| c.as_str()).collect();
        let declared = names.clone();
        names.sort_unstable();
        assert_eq!(names, declared);
    }
}
