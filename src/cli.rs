use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::auth::Credentials;
use crate::config::{Config, OutputFormat, ProbeMode};
use crate::framework::TwoAgentFramework;
use crate::output::{export_analysis, export_json};
use crate::providers::jenkins::FailureAnalysis;

#[derive(Parser)]
#[command(name = "triagelens")]
#[command(author, version, about = "CI failure triage for Jenkins builds", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (toml, json or yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Investigate a failed Jenkins build and propose fixes
    Analyze {
        build_url: String,

        #[arg(short, long, env = "JENKINS_USER")]
        user: Option<String>,

        #[arg(short, long, env = "JENKINS_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip TLS certificate verification
        #[arg(long, default_value_t = false)]
        insecure: bool,

        /// Use simulated environment and repository probes
        #[arg(long, default_value_t = false)]
        simulate: bool,

        /// Cluster API base URL; `{cluster}` is replaced by the cluster name
        #[arg(long)]
        cluster_api_url: Option<String>,

        /// Repository to clone when the build does not name one
        #[arg(long)]
        repository_url: Option<String>,
    },
    /// Scan a local console log for failure patterns
    Scan { log_file: PathBuf },
}

impl Cli {
    fn open_output(&self) -> Result<Box<dyn Write>> {
        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                Ok(Box::new(file))
            }
            None => Ok(Box::new(std::io::stdout().lock())),
        }
    }

    fn report_written(&self) {
        if let Some(path) = &self.output {
            info!("Report written to: {}", path.display());
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_analyze(
        &self,
        mut config: Config,
        build_url: &str,
        user: Option<&str>,
        token: Option<&str>,
        timeout: Option<u64>,
        insecure: bool,
        simulate: bool,
        cluster_api_url: Option<&str>,
        repository_url: Option<&str>,
    ) -> Result<()> {
        if let Some(timeout) = timeout {
            config.jenkins.timeout_secs = timeout;
        }
        if insecure {
            config.jenkins.accept_invalid_certs = true;
        }
        if simulate {
            config.probes.mode = ProbeMode::Simulated;
        }
        if let Some(url) = cluster_api_url {
            config.probes.cluster_api_url = Some(url.to_owned());
        }
        if let Some(url) = repository_url {
            config.probes.repository_url = Some(url.to_owned());
        }

        let credentials = Credentials::from_parts(
            user.or(config.jenkins.user.as_deref()),
            token.or(config.jenkins.token.as_deref()),
        );
        if credentials.is_none() {
            debug!("No Jenkins credentials supplied, using anonymous access");
        }

        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;
        let show_progress = format == OutputFormat::Summary && console::Term::stderr().is_term();

        let framework = TwoAgentFramework::from_config(&config, credentials)
            .context("Failed to set up the triage pipeline")?
            .with_progress(show_progress);

        let analysis = framework.analyze(build_url).await;

        let mut output = self.open_output()?;
        export_analysis(&analysis, format, pretty, &mut output)?;
        self.report_written();

        Ok(())
    }

    fn execute_scan(&self, config: &Config, log_file: &Path) -> Result<()> {
        info!("Scanning console log: {}", log_file.display());

        let contents = std::fs::read_to_string(log_file)
            .with_context(|| format!("Failed to read log file: {}", log_file.display()))?;
        let analysis = FailureAnalysis::analyze(&contents);

        let mut output = self.open_output()?;
        export_json(&analysis, self.pretty || config.output.pretty, &mut output)?;
        self.report_written();

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Analyze {
                build_url,
                user,
                token,
                timeout,
                insecure,
                simulate,
                cluster_api_url,
                repository_url,
            } => {
                self.execute_analyze(
                    config,
                    build_url,
                    user.as_deref(),
                    token.as_deref(),
                    *timeout,
                    *insecure,
                    *simulate,
                    cluster_api_url.as_deref(),
                    repository_url.as_deref(),
                )
                .await
            }
            Commands::Scan { log_file } => self.execute_scan(&config, log_file),
        }
    }
}
