//! download command - Fetch an object into a local file
//!
//! Stages job inputs referenced by `s3://` or S3 HTTP URIs.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use ru_core::{Job, Settings, Transfers};
use ru_s3::S3TransportFactory;

use super::{ConnectionArgs, load_job};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Download an object
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Object URI (s3://bucket/key or an S3 HTTP URL)
    pub uri: String,

    /// Local destination (relative to the job workpath when --job is given)
    pub dest: PathBuf,

    /// Job description providing uid and workpath
    #[arg(long)]
    pub job: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

fn job_for(args: &DownloadArgs) -> anyhow::Result<Job> {
    match &args.job {
        Some(path) => load_job(path),
        None => Ok(Job::new("download", std::env::current_dir()?, "")),
    }
}

/// Execute the download command
pub async fn execute(args: DownloadArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let config = match args.connection.load_config(&formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let job = match job_for(&args) {
        Ok(j) => j,
        Err(e) => return formatter.error(&format!("{e:#}"), ExitCode::UsageError),
    };

    let params = args.connection.params().or(config.params);
    let transfers = Transfers::with_factory(Arc::new(S3TransportFactory));

    let spinner = ProgressBar::spinner(&output_config, &format!("Downloading {}", args.uri));
    let result = transfers
        .download(&job, &Settings::default(), &args.uri, &args.dest, &params)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            formatter.downloaded(&outcome);
            ExitCode::Success
        }
        Err(e) => formatter.core_error(&format!("Failed to download {}", args.uri), &e),
    }
}
