use super::types::BuildMetadata;
use super::url::console_text_url;

/// Citation for the build record itself.
///
/// Job name and build number make the citation unique per build, e.g.
/// `[Jenkins:e2e:42:FAILURE:2024-05-01T10:00:00Z](https://ci/job/e2e/42/)`.
pub fn build_citation(metadata: &BuildMetadata) -> String {
    let timestamp = metadata
        .timestamp
        .map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
    format!(
        "[Jenkins:{}:{}:{}:{}]({})",
        metadata.job_name, metadata.build_number, metadata.result, timestamp, metadata.build_url
    )
}

/// Citation for the console log of a build.
pub fn console_citation(metadata: &BuildMetadata) -> String {
    format!(
        "[Console:{}:{}:console_log]({})",
        metadata.job_name,
        metadata.build_number,
        console_text_url(&metadata.build_url)
    )
}

/// Citation for repository state at a specific commit.
pub fn repository_citation(branch: &str, commit: &str, repository_url: Option<&str>) -> String {
    let short: String = commit.chars().take(12).collect();
    match repository_url {
        Some(url) => format!("[Repo:{branch}:{short}]({url})"),
        None => format!("[Repo:{branch}:{short}]"),
    }
}

/// Citation for an environment health check.
pub fn environment_citation(cluster: &str, probe: &str) -> String {
    format!("[Env:{cluster}:{probe}_health_check]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::jenkins::types::BuildResult;
    use chrono::{TimeZone, Utc};
    use indexmap::IndexMap;

    fn metadata() -> BuildMetadata {
        BuildMetadata {
            build_url: "https://ci.example.com/job/e2e/42/".to_string(),
            job_name: "e2e".to_string(),
            build_number: 42,
            result: BuildResult::Failure,
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()),
            parameters: IndexMap::new(),
            console_log_snippet: String::new(),
            artifacts: vec![],
            branch: None,
            commit_hash: None,
        }
    }

    #[test]
    fn test_build_citation() {
        assert_eq!(
            build_citation(&metadata()),
            "[Jenkins:e2e:42:FAILURE:2024-05-01T10:00:00Z](https://ci.example.com/job/e2e/42/)"
        );
    }

    #[test]
    fn test_build_citation_without_timestamp() {
        let mut metadata = metadata();
        metadata.timestamp = None;
        metadata.result = BuildResult::Unknown;
        assert_eq!(
            build_citation(&metadata),
            "[Jenkins:e2e:42:UNKNOWN:unknown](https://ci.example.com/job/e2e/42/)"
        );
    }

    #[test]
    fn test_console_citation() {
        assert_eq!(
            console_citation(&metadata()),
            "[Console:e2e:42:console_log](https://ci.example.com/job/e2e/42/consoleText)"
        );
    }

    #[test]
    fn test_repository_citation_shortens_commit() {
        assert_eq!(
            repository_citation("main", "4f2a9c1e7b3d5a6f8e9d0c1b2a3f4e5d6c7b8a9f", None),
            "[Repo:main:4f2a9c1e7b3d]"
        );
        assert_eq!(
            repository_citation("main", "4f2a9c1", Some("https://github.com/example/e2e.git")),
            "[Repo:main:4f2a9c1](https://github.com/example/e2e.git)"
        );
    }

    #[test]
    fn test_citations_differ_per_source() {
        let metadata = metadata();
        assert_ne!(build_citation(&metadata), console_citation(&metadata));
    }
}
