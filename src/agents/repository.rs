//! Repository checkout and static scan behind the [`RepositoryAnalyzer`] trait.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::error::{Result, TriageError};

use super::probes::ProbeKind;

const MAX_TEST_FILES: usize = 200;
const MAX_SCAN_DEPTH: usize = 8;
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target", "vendor", "dist", "build"];
const MANIFESTS: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "requirements.txt",
    "pyproject.toml",
];

/// What to check out.
#[derive(Debug, Clone, Default)]
pub struct RepositoryRequest {
    pub branch: String,
    pub commit_sha: Option<String>,
    pub repository_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    /// Dependency manifests found at the repository root
    pub manifests: Vec<String>,
    /// Test framework inferred from the manifests
    pub framework: Option<String>,
    pub dependencies_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    pub repository_cloned: bool,
    pub repository_url: Option<String>,
    pub branch: Option<String>,
    pub commit_sha: Option<String>,
    pub test_files: Vec<String>,
    pub dependency_analysis: DependencyAnalysis,
    /// Which analyzer produced this record; `None` when no analysis ran
    pub source: Option<ProbeKind>,
    pub detail: String,
}

impl RepositoryAnalysis {
    pub fn skipped(detail: &str) -> Self {
        Self {
            repository_cloned: false,
            repository_url: None,
            branch: None,
            commit_sha: None,
            test_files: vec![],
            dependency_analysis: DependencyAnalysis::default(),
            source: None,
            detail: detail.to_string(),
        }
    }

    fn failed(request: &RepositoryRequest, repository_url: Option<String>, detail: String) -> Self {
        Self {
            repository_url,
            branch: Some(request.branch.clone()),
            commit_sha: request.commit_sha.clone(),
            source: Some(ProbeKind::Live),
            ..Self::skipped(&detail)
        }
    }
}

#[async_trait]
pub trait RepositoryAnalyzer: Send + Sync {
    fn kind(&self) -> ProbeKind;

    async fn analyze(&self, request: &RepositoryRequest) -> RepositoryAnalysis;
}

/// Fixed checkout result for fixtures and offline runs.
pub struct SimulatedRepositoryAnalyzer;

#[async_trait]
impl RepositoryAnalyzer for SimulatedRepositoryAnalyzer {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Simulated
    }

    async fn analyze(&self, request: &RepositoryRequest) -> RepositoryAnalysis {
        RepositoryAnalysis {
            repository_cloned: true,
            repository_url: request.repository_url.clone(),
            branch: Some(request.branch.clone()),
            commit_sha: request.commit_sha.clone(),
            test_files: vec![
                "tests/e2e/login.spec.js".to_string(),
                "tests/e2e/smoke.spec.js".to_string(),
                "tests/support/commands.js".to_string(),
            ],
            dependency_analysis: DependencyAnalysis {
                manifests: vec!["package.json".to_string()],
                framework: Some("cypress".to_string()),
                dependencies_valid: true,
            },
            source: Some(ProbeKind::Simulated),
            detail: "simulated repository analysis, nothing was cloned".to_string(),
        }
    }
}

/// Shallow-clones the branch with `git` and scans the checkout.
pub struct GitRepositoryAnalyzer {
    fallback_url: Option<String>,
    clone_timeout: Duration,
}

impl GitRepositoryAnalyzer {
    pub fn new(fallback_url: Option<String>, clone_timeout: Duration) -> Self {
        Self {
            fallback_url,
            clone_timeout,
        }
    }

    async fn run_git(&self, operation: &str, args: &[OsString], current_dir: &Path) -> Result<()> {
        let command = Command::new("git")
            .args(args)
            .current_dir(current_dir)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.clone_timeout, command)
            .await
            .map_err(|_| TriageError::Git {
                operation: operation.to_string(),
                message: format!("timed out after {}s", self.clone_timeout.as_secs()),
            })??;

        if !output.status.success() {
            return Err(TriageError::Git {
                operation: operation.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }

    async fn clone_branch(&self, url: &str, branch: &str, target_dir: &Path) -> Result<()> {
        debug!("Cloning {url} ({branch}) into {}", target_dir.display());
        let parent = target_dir.parent().unwrap_or(target_dir);
        self.run_git("clone", &clone_args(url, branch, target_dir), parent)
            .await
    }

    /// Moves the shallow checkout from the branch tip to the build commit.
    async fn checkout_commit(&self, repo_dir: &Path, commit: &str) -> Result<()> {
        debug!("Checking out build commit {commit}");
        let fetch: Vec<OsString> = ["fetch", "--depth", "1", "origin", commit]
            .iter()
            .map(OsString::from)
            .collect();
        self.run_git("fetch", &fetch, repo_dir).await?;

        let checkout: Vec<OsString> = ["checkout", "--detach", commit]
            .iter()
            .map(OsString::from)
            .collect();
        self.run_git("checkout", &checkout, repo_dir).await
    }

    async fn head_commit(repo_dir: &Path) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(repo_dir)
            .output()
            .await
            .ok()?;

        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl RepositoryAnalyzer for GitRepositoryAnalyzer {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Live
    }

    async fn analyze(&self, request: &RepositoryRequest) -> RepositoryAnalysis {
        let Some(url) = request.repository_url.clone().or_else(|| self.fallback_url.clone()) else {
            return RepositoryAnalysis::failed(request, None, "no repository URL available".to_string());
        };

        let checkout = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Could not create checkout directory: {e}");
                return RepositoryAnalysis::failed(request, Some(url), e.to_string());
            }
        };

        if let Err(e) = self.clone_branch(&url, &request.branch, checkout.path()).await {
            warn!("Repository analysis skipped: {e}");
            return RepositoryAnalysis::failed(request, Some(url), e.to_string());
        }

        if let Some(commit) = request.commit_sha.as_deref().filter(|c| is_commit_sha(c)) {
            if let Err(e) = self.checkout_commit(checkout.path(), commit).await {
                warn!("Could not check out build commit {commit}, scanning the branch tip: {e}");
            }
        }

        let head = Self::head_commit(checkout.path()).await;

        let scan = tokio::task::spawn_blocking(move || {
            let result = scan_checkout(checkout.path());
            drop(checkout);
            result
        })
        .await;

        let (test_files, dependency_analysis) = match scan {
            Ok(result) => result,
            Err(e) => {
                warn!("Repository scan failed: {e}");
                return RepositoryAnalysis::failed(request, Some(url), e.to_string());
            }
        };

        info!(
            "Scanned {url} ({}): {} test file(s), manifests {:?}",
            request.branch,
            test_files.len(),
            dependency_analysis.manifests
        );

        RepositoryAnalysis {
            repository_cloned: true,
            repository_url: Some(url),
            branch: Some(request.branch.clone()),
            commit_sha: head.or_else(|| request.commit_sha.clone()),
            test_files,
            dependency_analysis,
            source: Some(ProbeKind::Live),
            detail: "shallow clone scanned".to_string(),
        }
    }
}

/// `git clone` arguments, with `--` ending option parsing before the URL.
fn clone_args(url: &str, branch: &str, target_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "clone",
        "--depth",
        "1",
        "--single-branch",
        "--branch",
        branch,
        "--",
        url,
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(target_dir.as_os_str().to_owned());
    args
}

/// Hex object name, abbreviated or full.
fn is_commit_sha(value: &str) -> bool {
    (7..=40).contains(&value.len()) && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Lists test files and inspects dependency manifests of a checkout.
pub fn scan_checkout(root: &Path) -> (Vec<String>, DependencyAnalysis) {
    let mut test_files: Vec<String> = WalkDir::new(root)
        .max_depth(MAX_SCAN_DEPTH)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_dir() && SKIPPED_DIRS.iter().any(|skipped| name == *skipped))
        })
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let relative = relative.to_string_lossy().replace('\\', "/");
            is_test_file(&relative).then_some(relative)
        })
        .collect();

    test_files.sort();
    test_files.truncate(MAX_TEST_FILES);

    (test_files, analyze_dependencies(root))
}

fn is_test_file(relative_path: &str) -> bool {
    let lower = relative_path.to_ascii_lowercase();
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);

    let by_name = [".test.", ".spec.", ".cy.", "_test."]
        .iter()
        .any(|marker| file_name.contains(marker))
        || file_name.starts_with("test_");

    let by_dir = lower
        .split('/')
        .rev()
        .skip(1)
        .any(|dir| matches!(dir, "tests" | "test" | "e2e" | "cypress" | "__tests__"));

    by_name || by_dir
}

fn analyze_dependencies(root: &Path) -> DependencyAnalysis {
    let manifests: Vec<String> = MANIFESTS
        .iter()
        .filter(|name| root.join(name).is_file())
        .map(|name| (*name).to_string())
        .collect();

    let mut dependencies_valid = !manifests.is_empty();
    let mut framework = None;

    if manifests.iter().any(|m| m == "package.json") {
        match std::fs::read_to_string(root.join("package.json"))
            .ok()
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
        {
            Some(package) => framework = javascript_framework(&package),
            None => dependencies_valid = false,
        }
    }

    if framework.is_none() {
        framework = manifests.iter().find_map(|m| match m.as_str() {
            "Cargo.toml" => Some("cargo-test".to_string()),
            "go.mod" => Some("go-test".to_string()),
            "pom.xml" | "build.gradle" => Some("junit".to_string()),
            "requirements.txt" | "pyproject.toml" => Some("pytest".to_string()),
            _ => None,
        });
    }

    DependencyAnalysis {
        manifests,
        framework,
        dependencies_valid,
    }
}

fn javascript_framework(package: &serde_json::Value) -> Option<String> {
    let declared = |name: &str| {
        ["dependencies", "devDependencies"]
            .iter()
            .any(|section| package.get(section).and_then(|deps| deps.get(name)).is_some())
    };

    [
        ("cypress", "cypress"),
        ("@playwright/test", "playwright"),
        ("webdriverio", "webdriverio"),
        ("selenium-webdriver", "selenium"),
        ("jest", "jest"),
        ("mocha", "mocha"),
    ]
    .iter()
    .find(|(package_name, _)| declared(package_name))
    .map(|(_, framework)| (*framework).to_string())
}
