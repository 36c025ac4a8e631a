//! CLI command definitions and execution
//!
//! `upload` runs the post-render action against a job file; `download`
//! stages an object referenced by URI.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ru_core::{ConfigManager, CredentialParams, Job, TransferParams};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod download;
mod upload;

/// ru - render-upload
///
/// Delivers render outputs to S3-compatible object storage.
#[derive(Parser, Debug)]
#[command(name = "ru")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a job's rendered output and record its public URL
    Upload(upload::UploadArgs),

    /// Download an object into a local file
    Download(download::DownloadArgs),
}

/// Where to connect and with which credentials
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// AWS region
    #[arg(long)]
    pub region: Option<String>,

    /// Endpoint URL of an S3-compatible provider (takes precedence over region)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Named profile from the shared AWS configuration
    #[arg(long, conflicts_with_all = ["access_key", "secret_key"])]
    pub profile: Option<String>,

    /// Access key ID
    #[arg(long, requires = "secret_key")]
    pub access_key: Option<String>,

    /// Secret access key
    #[arg(long, requires = "access_key")]
    pub secret_key: Option<String>,

    /// Configuration file (defaults to ~/.config/render-upload/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ConnectionArgs {
    fn credentials(&self) -> Option<CredentialParams> {
        if let Some(profile) = &self.profile {
            return Some(CredentialParams::profile(profile));
        }
        match (&self.access_key, &self.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                Some(CredentialParams::keys(access_key, secret_key))
            }
            _ => None,
        }
    }

    /// Transfer parameters carrying only the connection flags
    pub fn params(&self) -> TransferParams {
        TransferParams {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            credentials: self.credentials(),
            ..Default::default()
        }
    }

    fn config_manager(&self) -> ru_core::Result<ConfigManager> {
        match &self.config {
            Some(path) => Ok(ConfigManager::with_path(path.clone())),
            None => ConfigManager::new(),
        }
    }

    /// Load the configuration file, reporting failures through `formatter`
    pub fn load_config(&self, formatter: &Formatter) -> Result<ru_core::Config, ExitCode> {
        self.config_manager()
            .and_then(|manager| manager.load())
            .map_err(|e| formatter.core_error("Failed to load config", &e))
    }
}

/// Read a job description from a JSON file
pub fn load_job(path: &Path) -> anyhow::Result<Job> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse job file {}", path.display()))
}

/// Write a job description back to its JSON file
pub fn save_job(path: &Path, job: &Job) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(job).context("Failed to serialize job")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write job file {}", path.display()))
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Upload(args) => upload::execute(args, output_config).await,
        Commands::Download(args) => download::execute(args, output_config).await,
    }
}
