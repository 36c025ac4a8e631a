//! upload command - Run the post-render upload action
//!
//! Uploads the job's rendered output and prints the resulting public URL.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use ru_core::{
    ActionHooks, ActionOptions, Config, Job, ProgressObserver, Settings, Tag, TransferParams,
    Transfers, UploadAction,
};
use ru_s3::S3TransportFactory;

use super::{ConnectionArgs, load_job, save_job};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Upload a rendered output
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Job description (JSON with uid, workpath and output)
    #[arg(long)]
    pub job: PathBuf,

    /// File to upload (defaults to the job's output, relative to its workpath)
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Destination bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Destination key
    #[arg(long)]
    pub key: Option<String>,

    /// Canned ACL, e.g. public-read
    #[arg(long)]
    pub acl: Option<String>,

    /// Content type of the uploaded object
    #[arg(long)]
    pub content_type: Option<String>,

    /// User metadata (repeatable)
    #[arg(long = "metadata", value_name = "KEY=VALUE")]
    pub metadata: Vec<Tag>,

    /// Object tag (repeatable)
    #[arg(long = "tag", value_name = "KEY=VALUE")]
    pub tags: Vec<Tag>,

    /// Scheduler phase the action runs in
    #[arg(long)]
    pub mode: Option<String>,

    /// Store the updated job back into the job file
    #[arg(long)]
    pub write_back: bool,
}

/// Clears the progress bar once the action completes
struct ProgressHooks {
    progress: Arc<ProgressBar>,
}

impl ActionHooks for ProgressHooks {
    fn on_start(&self, job: &Job) {
        tracing::debug!(uid = %job.uid, "Upload action started");
    }

    fn on_complete(&self, _job: &Job) {
        self.progress.finish_and_clear();
    }
}

impl UploadArgs {
    /// Transfer parameters from flags, with unset fields taken from `config`
    fn params(&self, config: &Config) -> TransferParams {
        let flags = TransferParams {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            acl: self.acl.clone(),
            content_type: self
                .content_type
                .clone()
                .unwrap_or_else(|| config.params.content_type.clone()),
            metadata: (!self.metadata.is_empty()).then(|| {
                self.metadata
                    .iter()
                    .map(|tag| (tag.key.clone(), tag.value.clone()))
                    .collect::<BTreeMap<_, _>>()
            }),
            ..self.connection.params()
        };
        flags.or(config.params.clone())
    }

    fn tags(&self, config: &Config) -> Vec<Tag> {
        if self.tags.is_empty() {
            config.tags.clone()
        } else {
            self.tags.clone()
        }
    }
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, mut output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let config = match args.connection.load_config(&formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };
    output_config.no_progress |= !config.defaults.progress;

    let job = match load_job(&args.job) {
        Ok(j) => j,
        Err(e) => return formatter.error(&format!("{e:#}"), ExitCode::UsageError),
    };

    let input = job.resolve_input(args.input.as_deref());
    let progress = Arc::new(ProgressBar::percent(
        &output_config,
        &format!("Uploading {}", input.display()),
    ));
    let observer: Arc<dyn ProgressObserver> = progress.clone();
    let options = ActionOptions {
        input: args.input.clone(),
        params: args.params(&config),
        tags: args.tags(&config),
        on_progress: Some(observer),
    };
    let hooks = ProgressHooks {
        progress: Arc::clone(&progress),
    };
    let mode = args.mode.clone().unwrap_or(config.defaults.mode);

    let transfers = Arc::new(Transfers::with_factory(Arc::new(S3TransportFactory)));
    let action = UploadAction::new(transfers);

    match action
        .run(job, &Settings::default(), options, &hooks, &mode)
        .await
    {
        Ok(job) => {
            if args.write_back
                && let Err(e) = save_job(&args.job, &job)
            {
                return formatter.error(&format!("{e:#}"), ExitCode::GeneralError);
            }
            formatter.uploaded(&input, &job);
            ExitCode::Success
        }
        Err(rejected) => {
            progress.finish_and_clear();
            formatter.error(&rejected.to_string(), ExitCode::from(&rejected.error))
        }
    }
}
