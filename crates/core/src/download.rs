//! Download operation
//!
//! Fetches an object referenced by URI into a local file, typically to stage
//! a job input.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::job::{Job, Settings};
use crate::params::TransferParams;
use crate::traits::ResponseReader;
use crate::transfer::Transfers;
use crate::uri::{ObjectLocation, check_supported_provider, parse_s3_uri};

/// Result of a completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub source: ObjectLocation,
    /// Local file written
    pub path: PathBuf,
    pub bytes: u64,
}

impl Transfers {
    /// Download `src_uri` into `dest`
    ///
    /// The URI must name both a bucket and a key; this is checked before
    /// anything is written. Relative destinations resolve against the job's
    /// working directory. The client comes from `params` (endpoint or
    /// region), falling back to the region encoded in the URI.
    pub async fn download(
        &self,
        job: &Job,
        settings: &Settings,
        src_uri: &str,
        dest: &Path,
        params: &TransferParams,
    ) -> Result<DownloadOutcome> {
        check_supported_provider(src_uri)?;
        let source = parse_s3_uri(src_uri)?.into_location()?;
        let dest = job.resolve_path(dest);

        settings.log_job(
            job,
            &format!(
                "action-download: downloading {source} to {}",
                dest.display()
            ),
        );

        let client = self.client_for(params, source.region.as_deref()).await?;
        let body = client.get_object(&source.bucket, &source.key).await?;

        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = match write_body(body.reader, &dest).await {
            Ok(bytes) => bytes,
            Err(e) => {
                // A truncated file must not pass for a staged input
                if let Err(cleanup) = tokio::fs::remove_file(&dest).await {
                    tracing::warn!(
                        path = %dest.display(),
                        error = %cleanup,
                        "Failed to remove partial download"
                    );
                }
                return Err(e.into());
            }
        };

        tracing::debug!(
            expected = ?body.content_length,
            written = bytes,
            "Download finished"
        );
        settings.log_job(
            job,
            &format!(
                "action-download: download complete: {} ({})",
                dest.display(),
                humansize::format_size(bytes, humansize::BINARY)
            ),
        );

        Ok(DownloadOutcome {
            source,
            path: dest,
            bytes,
        })
    }
}

async fn write_body(mut reader: ResponseReader, dest: &Path) -> std::io::Result<u64> {
    let mut file = tokio::fs::File::create(dest).await?;
    let bytes = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    Ok(bytes)
}
