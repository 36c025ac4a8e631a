//! Upload operation
//!
//! Streams a local file to the object store and reports the public URL of
//! the stored object.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

use crate::error::{Error, Result};
use crate::job::{Job, ProgressObserver, Settings};
use crate::output_url::{build_output_url, resolve_output_url};
use crate::params::{Tag, TransferParams};
use crate::traits::PutObjectRequest;
use crate::transfer::Transfers;

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Public URL of the stored object
    pub url: String,
    /// Number of bytes uploaded
    pub bytes: u64,
    pub etag: Option<String>,
}

/// Integer percent complete, rounded up
pub fn percent_complete(loaded: u64, total: u64) -> u32 {
    if total == 0 {
        return 100;
    }
    (u128::from(loaded) * 100).div_ceil(u128::from(total)).min(100) as u32
}

/// Progress state shared between the body reader and the upload
struct UploadProgress {
    job: Job,
    settings: Settings,
    observer: Option<Arc<dyn ProgressObserver>>,
    total: u64,
    loaded: AtomicU64,
    reported: AtomicU32,
}

impl UploadProgress {
    fn advance(&self, bytes: u64) {
        let loaded = self.loaded.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.report(percent_complete(loaded, self.total));
    }

    /// Notify only when the percentage moves forward
    fn report(&self, percent: u32) {
        if self.reported.fetch_max(percent, Ordering::SeqCst) >= percent {
            return;
        }
        if let Some(observer) = &self.observer {
            observer.on_progress(&self.job, percent);
        }
        self.settings.log_job(
            &self.job,
            &format!("action-upload: upload progress {percent}%..."),
        );
    }
}

/// Reader that feeds byte counts into [`UploadProgress`]
struct ProgressReader<R> {
    inner: R,
    progress: Arc<UploadProgress>,
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            let read = buf.filled().len() - before;
            if read > 0 {
                this.progress.advance(read as u64);
            }
        }
        poll
    }
}

async fn open_source(src: &Path) -> Result<(tokio::fs::File, u64)> {
    let read_error = |e: io::Error| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("Failed to read {}: {e}", src.display()),
        ))
    };
    let file = tokio::fs::File::open(src).await.map_err(read_error)?;
    let metadata = file.metadata().await.map_err(read_error)?;
    if metadata.is_dir() {
        return Err(Error::Io(io::Error::other(format!(
            "Failed to read {}: is a directory",
            src.display()
        ))));
    }
    Ok((file, metadata.len()))
}

impl Transfers {
    /// Upload `src` to the location described by `params`
    ///
    /// Parameters are validated before any I/O. The progress observer sees
    /// non-decreasing percentages ending at 100. Nothing is retried.
    pub async fn upload(
        &self,
        job: &Job,
        settings: &Settings,
        src: &Path,
        params: &TransferParams,
        tags: &[Tag],
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<UploadOutcome> {
        let target = params.validate_upload()?;
        let output = build_output_url(params);

        settings.log_job(
            job,
            &format!("action-upload: input file {}", src.display()),
        );
        if let Some(url) = &output {
            settings.log_job(job, &format!("action-upload: output file {url}"));
        }

        let (file, total) = open_source(src).await?;
        let client = self.client_for(params, None).await?;

        let progress = Arc::new(UploadProgress {
            job: job.clone(),
            settings: settings.clone(),
            observer,
            total,
            loaded: AtomicU64::new(0),
            reported: AtomicU32::new(0),
        });
        let request = PutObjectRequest {
            bucket: target.bucket.to_string(),
            key: target.key.to_string(),
            acl: target.acl.to_string(),
            content_type: params.content_type.clone(),
            metadata: params.metadata.clone().unwrap_or_default(),
            tags: tags.to_vec(),
            body: Box::pin(ProgressReader {
                inner: file,
                progress: Arc::clone(&progress),
            }),
            content_length: total,
        };

        let response = client.put_object(request).await?;
        // Zero-byte bodies never produce a read
        progress.report(100);

        let url = resolve_output_url(params, response.location.as_deref())
            .unwrap_or_else(|| output.unwrap_or_default());
        settings.log_job(job, &format!("action-upload: upload complete: {url}"));

        Ok(UploadOutcome {
            url,
            bytes: total,
            etag: response.etag.map(|e| e.trim_matches('"').to_string()),
        })
    }
}
