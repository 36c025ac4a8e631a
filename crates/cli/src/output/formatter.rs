//! Result and error reporting for the ru commands
//!
//! Human mode prints one line per transfer; JSON mode prints a single document
//! on stdout for results and on stderr for failures.

use std::path::Path;

use console::style;
use ru_core::{DownloadOutcome, Job};
use serde::Serialize;

use super::OutputConfig;
use crate::exit_code::ExitCode;

/// JSON document for a finished upload
#[derive(Debug, Serialize)]
struct UploadReport<'a> {
    status: &'static str,
    url: &'a str,
    job: &'a Job,
}

/// JSON document for a finished download
#[derive(Debug, Serialize)]
struct DownloadReport {
    status: &'static str,
    source: String,
    path: String,
    size_bytes: u64,
    size_human: String,
}

/// JSON document for a failed command
#[derive(Debug, Serialize)]
struct ErrorReport<'a> {
    error: &'a str,
    exit_code: i32,
    reason: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Colors are off with --no-color and always in JSON mode
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Report a finished upload of `input`; the URL is the job's new output
    pub fn uploaded(&self, input: &Path, job: &Job) {
        if let Some(out) = self.upload_report(input, job) {
            println!("{out}");
        }
    }

    /// Report a finished download
    pub fn downloaded(&self, outcome: &DownloadOutcome) {
        if let Some(out) = self.download_report(outcome) {
            println!("{out}");
        }
    }

    /// Report a failure and hand back its exit code
    ///
    /// Failures are printed even in quiet mode.
    pub fn error(&self, message: &str, code: ExitCode) -> ExitCode {
        eprintln!("{}", self.error_report(message, code));
        code
    }

    /// Report a core error under `context`, exiting with the code it maps to
    pub fn core_error(&self, context: &str, err: &ru_core::Error) -> ExitCode {
        self.error(&format!("{context}: {err}"), ExitCode::from(err))
    }

    fn upload_report(&self, input: &Path, job: &Job) -> Option<String> {
        if self.config.json {
            return Some(to_json(&UploadReport {
                status: "success",
                url: &job.output,
                job,
            }));
        }
        self.success_line(&format!(
            "{} -> {}",
            input.display(),
            self.highlight(&job.output)
        ))
    }

    fn download_report(&self, outcome: &DownloadOutcome) -> Option<String> {
        let size_human = humansize::format_size(outcome.bytes, humansize::BINARY);
        if self.config.json {
            return Some(to_json(&DownloadReport {
                status: "success",
                source: outcome.source.to_string(),
                path: outcome.path.display().to_string(),
                size_bytes: outcome.bytes,
                size_human,
            }));
        }
        self.success_line(&format!(
            "{} -> {} ({size_human})",
            self.highlight(&outcome.source.to_string()),
            outcome.path.display()
        ))
    }

    fn success_line(&self, message: &str) -> Option<String> {
        if self.config.quiet {
            return None;
        }
        Some(if self.colors_enabled() {
            format!("{} {message}", style("✓").green())
        } else {
            format!("✓ {message}")
        })
    }

    fn error_report(&self, message: &str, code: ExitCode) -> String {
        if self.config.json {
            to_json(&ErrorReport {
                error: message,
                exit_code: code.as_i32(),
                reason: code.description(),
            })
        } else if self.colors_enabled() {
            format!("{} {message}", style("✗").red())
        } else {
            format!("✗ {message}")
        }
    }

    fn highlight(&self, value: &str) -> String {
        if self.colors_enabled() {
            style(value).cyan().to_string()
        } else {
            value.to_string()
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error":"failed to serialize output: {e}"}}"#))
}
