use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Final status Jenkins reports for a build.
///
/// A build that is still running (or whose metadata could not be fetched)
/// has no result in the remote API and maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
    #[default]
    Unknown,
}

impl BuildResult {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_uppercase).as_deref() {
            Some("SUCCESS") => Self::Success,
            Some("FAILURE") => Self::Failure,
            Some("UNSTABLE") => Self::Unstable,
            Some("ABORTED") => Self::Aborted,
            Some("NOT_BUILT") => Self::NotBuilt,
            _ => Self::Unknown,
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Unstable => "UNSTABLE",
            Self::Aborted => "ABORTED",
            Self::NotBuilt => "NOT_BUILT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything fetched about a single Jenkins build.
///
/// Built once per analysis and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMetadata {
    /// Build URL as given by the user
    pub build_url: String,
    /// Job name, folder jobs joined with `/` (e.g., "team/e2e-tests")
    pub job_name: String,
    /// Build number, 0 when the URL has no trailing numeric segment
    pub build_number: u64,
    pub result: BuildResult,
    pub timestamp: Option<DateTime<Utc>>,
    /// Build parameters in the order Jenkins lists them
    pub parameters: IndexMap<String, serde_json::Value>,
    /// Leading slice of the console log
    pub console_log_snippet: String,
    /// Archived artifact paths relative to the build
    pub artifacts: Vec<String>,
    /// Branch recorded by the git plugin
    pub branch: Option<String>,
    /// Revision recorded by the git plugin
    pub commit_hash: Option<String>,
}

/// Subset of `<build>/api/json` that the triage pipeline reads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BuildResponse {
    pub result: Option<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub actions: Vec<Option<BuildAction>>,
    #[serde(default)]
    pub artifacts: Vec<BuildArtifact>,
}

/// One entry of the heterogeneous `actions` array.
///
/// Only parameter and git build-data actions carry fields we use; every
/// other action deserializes to an empty value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BuildAction {
    #[serde(default)]
    pub parameters: Vec<BuildParameter>,
    pub last_built_revision: Option<BuiltRevision>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuildParameter {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuiltRevision {
    #[serde(rename = "SHA1")]
    pub sha1: Option<String>,
    #[serde(default)]
    pub branch: Vec<BuiltBranch>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuiltBranch {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BuildArtifact {
    pub relative_path: Option<String>,
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_result_parse_known_values() {
        assert_eq!(BuildResult::parse(Some("SUCCESS")), BuildResult::Success);
        assert_eq!(BuildResult::parse(Some("failure")), BuildResult::Failure);
        assert_eq!(BuildResult::parse(Some("NOT_BUILT")), BuildResult::NotBuilt);
    }

    #[test]
    fn test_build_result_parse_missing_is_unknown() {
        assert_eq!(BuildResult::parse(None), BuildResult::Unknown);
        assert_eq!(BuildResult::parse(Some("BUILDING")), BuildResult::Unknown);
        assert!(!BuildResult::Unknown.is_known());
    }

    #[test]
    fn test_build_result_serializes_screaming_case() {
        let json = serde_json::to_string(&BuildResult::NotBuilt).unwrap();
        assert_eq!(json, "\"NOT_BUILT\"");
    }

    #[test]
    fn test_build_response_tolerates_unrelated_actions() {
        let body = r#"{
            "result": "FAILURE",
            "timestamp": 1700000000000,
            "actions": [
                {"_class": "hudson.model.CauseAction", "causes": []},
                null,
                {"_class": "hudson.model.ParametersAction",
                 "parameters": [{"name": "CLUSTER_NAME", "value": "qe6"}]},
                {"_class": "hudson.plugins.git.util.BuildData",
                 "lastBuiltRevision": {"SHA1": "abc1234def", "branch": [{"name": "origin/main"}]}}
            ],
            "artifacts": [{"fileName": "report.xml", "relativePath": "results/report.xml"}]
        }"#;

        let response: BuildResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.result.as_deref(), Some("FAILURE"));
        assert_eq!(response.actions.len(), 4);
        let params: Vec<_> = response
            .actions
            .iter()
            .flatten()
            .flat_map(|a| &a.parameters)
            .collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "CLUSTER_NAME");
        assert_eq!(response.artifacts[0].relative_path.as_deref(), Some("results/report.xml"));
    }
}
