//! Render job and scheduler settings
//!
//! The job scheduler owns these records; this crate reads `uid`, `workpath`
//! and `output`, and rewrites `output` after a successful upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A render job in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier, used to prefix log lines
    pub uid: String,

    /// Working directory that relative paths resolve against
    pub workpath: PathBuf,

    /// Rendered file path, or the public URL once uploaded
    #[serde(default)]
    pub output: String,
}

impl Job {
    pub fn new(
        uid: impl Into<String>,
        workpath: impl Into<PathBuf>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            workpath: workpath.into(),
            output: output.into(),
        }
    }

    /// Resolve the file to upload
    ///
    /// Falls back to the job's current output when no explicit input is
    /// given; relative paths are joined to the working directory.
    pub fn resolve_input(&self, input: Option<&Path>) -> PathBuf {
        self.resolve_path(input.unwrap_or_else(|| Path::new(&self.output)))
    }

    /// Join relative paths to the working directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workpath.join(path)
        }
    }
}

/// Sink for human-readable progress lines
pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

/// Logger that forwards every line to `tracing` at INFO level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "render_upload", "{message}");
    }
}

/// Scheduler-provided settings
#[derive(Clone)]
pub struct Settings {
    pub logger: Arc<dyn Logger>,
}

impl Settings {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// Log a line prefixed with the job id
    pub(crate) fn log_job(&self, job: &Job, message: &str) {
        self.logger.log(&format!("[{}] {message}", job.uid));
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger))
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}

/// Observer notified with integer percent complete during an upload
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, job: &Job, percent: u32);
}

impl<F> ProgressObserver for F
where
    F: Fn(&Job, u32) + Send + Sync,
{
    fn on_progress(&self, job: &Job, percent: u32) {
        self(job, percent)
    }
}
