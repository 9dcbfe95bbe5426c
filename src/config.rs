use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for triagelens.
///
/// Lets users keep Jenkins credentials, probe settings and output preferences
/// in one place instead of repeating flags on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Jenkins connection settings
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    /// Environment and repository probe settings
    #[serde(default)]
    pub probes: ProbesConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// Jenkins user name for basic auth
    pub user: Option<String>,

    /// Jenkins API token
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification (self-signed internal CI only)
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// How much of the console log is kept for analysis
    #[serde(default = "default_console_snippet_bytes")]
    pub console_snippet_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProbesConfig {
    /// Whether environment and repository checks run for real
    #[serde(default)]
    pub mode: ProbeMode,

    /// Cluster API base URL; `{cluster}` is replaced by the cluster name
    pub cluster_api_url: Option<String>,

    /// Repository to clone when the build parameters do not name one
    pub repository_url: Option<String>,

    /// Upper bound for `git clone`, in seconds
    #[serde(default = "default_clone_timeout_secs")]
    pub clone_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    #[default]
    Live,
    Simulated,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
            console_snippet_bytes: default_console_snippet_bytes(),
        }
    }
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            mode: ProbeMode::default(),
            cluster_api_url: None,
            repository_url: None,
            clone_timeout_secs: default_clone_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_console_snippet_bytes() -> usize {
    2048
}

fn default_clone_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./triagelens.toml
    /// 3. ./triagelens.json
    /// 4. ./triagelens.yaml
    /// 5. ./triagelens.yml
    /// 6. `<user config dir>/triagelens/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "triagelens.toml",
            "triagelens.json",
            "triagelens.yaml",
            "triagelens.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = user_config_path().filter(|p| p.exists()) {
            return Self::load_from_path(&path);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("triagelens").join("config.toml"))
}
