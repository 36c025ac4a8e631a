//! Post-render upload action
//!
//! This is what the job scheduler invokes once a render finishes. It uploads
//! the rendered file and replaces `job.output` with the public URL.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Error;
use crate::job::{Job, ProgressObserver, Settings};
use crate::params::{Tag, TransferParams};
use crate::transfer::Transfers;

/// Name reported in mode errors
pub const ACTION_NAME: &str = "render-upload";

/// The only scheduler phase this action runs in
pub const SUPPORTED_MODE: &str = "postrender";

/// Per-invocation options
#[derive(Default)]
pub struct ActionOptions {
    /// File to upload; defaults to the job's output
    pub input: Option<PathBuf>,
    pub params: TransferParams,
    pub tags: Vec<Tag>,
    pub on_progress: Option<Arc<dyn ProgressObserver>>,
}

impl std::fmt::Debug for ActionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionOptions")
            .field("input", &self.input)
            .field("params", &self.params)
            .field("tags", &self.tags)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Lifecycle callbacks fired around an invocation
pub trait ActionHooks: Send + Sync {
    fn on_start(&self, _job: &Job) {}

    /// Fires after `job.output` has been updated on success, or with the
    /// unchanged job on failure
    fn on_complete(&self, _job: &Job) {}
}

/// No hooks
impl ActionHooks for () {}

/// A failed invocation, carrying the job as it was received
#[derive(Debug)]
pub struct Rejected {
    pub job: Job,
    pub error: Error,
}

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for Rejected {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The upload action bound to a set of transfers
pub struct UploadAction {
    transfers: Arc<Transfers>,
}

impl UploadAction {
    pub fn new(transfers: Arc<Transfers>) -> Self {
        Self { transfers }
    }

    /// Run the action for `job`
    ///
    /// `on_start` always fires first. On success the returned job carries the
    /// uploaded URL in `output` and `on_complete` has fired. On failure
    /// `on_complete` fires once (except for a mode mismatch, which is
    /// rejected before any work) and the job is handed back unchanged.
    pub async fn run(
        &self,
        mut job: Job,
        settings: &Settings,
        options: ActionOptions,
        hooks: &dyn ActionHooks,
        mode: &str,
    ) -> Result<Job, Rejected> {
        hooks.on_start(&job);

        if mode != SUPPORTED_MODE {
            return Err(Rejected {
                job,
                error: Error::UnsupportedMode {
                    action: ACTION_NAME,
                    expected: SUPPORTED_MODE,
                    provided: mode.to_string(),
                },
            });
        }

        let input = job.resolve_input(options.input.as_deref());
        settings.log_job(&job, "starting action-upload action");
        tracing::debug!(uid = %job.uid, input = %input.display(), "Running upload action");

        let result = self
            .transfers
            .upload(
                &job,
                settings,
                &input,
                &options.params,
                &options.tags,
                options.on_progress,
            )
            .await;

        match result {
            Ok(outcome) => {
                job.output = outcome.url;
                hooks.on_complete(&job);
                Ok(job)
            }
            Err(error) => {
                tracing::debug!(uid = %job.uid, %error, "Upload action failed");
                hooks.on_complete(&job);
                Err(Rejected { job, error })
            }
        }
    }
}
