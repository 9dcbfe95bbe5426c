use regex::Regex;
use std::sync::LazyLock;

static JOB_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/job/([^/?#]+)").expect("valid job segment regex"));

static BUILD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)/?(?:[?#].*)?$").expect("valid build number regex"));

/// Job name used when a URL carries no `/job/` segment.
pub const UNKNOWN_JOB: &str = "unknown";

/// Extracts the job name and build number from a Jenkins build URL.
///
/// `https://ci.example.com/job/folder/job/e2e/42/` yields `("folder/e2e", 42)`.
/// Missing pieces fall back to [`UNKNOWN_JOB`] and build number 0.
pub fn parse_build_url(build_url: &str) -> (String, u64) {
    let segments: Vec<&str> = JOB_SEGMENT
        .captures_iter(build_url)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let job_name = if segments.is_empty() {
        UNKNOWN_JOB.to_string()
    } else {
        segments.join("/")
    };

    let build_number = BUILD_NUMBER
        .captures(build_url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    (job_name, build_number)
}

/// `<build>/api/json`
pub fn api_json_url(build_url: &str) -> String {
    format!("{}/api/json", build_url.trim_end_matches('/'))
}

/// `<build>/consoleText`
pub fn console_text_url(build_url: &str) -> String {
    format!("{}/consoleText", build_url.trim_end_matches('/'))
}
