//! S3 object URI parsing
//!
//! Accepts the URI forms a job may reference an input object by:
//! - `s3://bucket/key`
//! - virtual-host style: `https://bucket.s3.amazonaws.com/key`,
//!   `https://bucket.s3.region.amazonaws.com/key`,
//!   `https://bucket.s3-region.amazonaws.com/key`
//! - path style: `https://s3.region.amazonaws.com/bucket/key`,
//!   `https://s3-region.amazonaws.com/bucket/key`

use url::Url;

use crate::error::{Error, MissingParameter, Result};

/// Provider hosts the parser cannot address correctly
const UNSUPPORTED_HOSTS: &[(&str, &str)] = &[("digitaloceanspaces.com", "Digital Ocean Spaces")];

/// Region implied by hosts without an explicit one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Components of an object URI; any of them may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub region: Option<String>,
}

/// A bucket/key pair that is known to be complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
    pub region: Option<String>,
}

impl S3Uri {
    /// Require both bucket and key
    pub fn into_location(self) -> Result<ObjectLocation> {
        let bucket = self.bucket.ok_or(MissingParameter::Bucket)?;
        let key = self.key.ok_or(MissingParameter::Key)?;
        Ok(ObjectLocation {
            bucket,
            key,
            region: self.region,
        })
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Reject providers whose URIs are known not to parse into bucket and key
pub fn check_supported_provider(uri: &str) -> Result<()> {
    for (host, provider) in UNSUPPORTED_HOSTS {
        if uri.contains(host) {
            return Err(Error::UnsupportedProvider(format!(
                "{provider} URIs are not supported for downloads: {uri}"
            )));
        }
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn decode_key(raw: &str) -> Result<Option<String>> {
    let decoded = urlencoding::decode(raw)
        .map_err(|e| Error::InvalidUri(format!("Key is not valid UTF-8: {e}")))?;
    Ok(non_empty(&decoded))
}

/// Locate the `s3` label in a host and return `(index, region)`
///
/// The last match wins so that dotted bucket names stay intact.
fn find_s3_label(labels: &[&str]) -> Option<(usize, String)> {
    labels.iter().enumerate().rev().find_map(|(i, label)| {
        if *label == "s3" && i + 2 < labels.len() {
            Some((i, labels[i + 1].to_string()))
        } else if let Some(region) = label.strip_prefix("s3-") {
            (i + 1 < labels.len() && !region.is_empty()).then(|| (i, region.to_string()))
        } else {
            None
        }
    })
}

/// Parse an object URI into its components
///
/// Missing bucket or key are not errors here; use
/// [`S3Uri::into_location`] to require them.
pub fn parse_s3_uri(uri: &str) -> Result<S3Uri> {
    if let Some(rest) = uri.strip_prefix("s3://") {
        // s3:// URIs carry the bucket where an HTTP URI carries the host
        let url = Url::parse(&format!("http://{rest}"))?;
        return Ok(S3Uri {
            bucket: url.host_str().and_then(non_empty),
            key: decode_key(url.path().trim_start_matches('/'))?,
            region: None,
        });
    }

    let url = Url::parse(uri)?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidUri(format!("Missing host: {uri}")))?;
    let labels: Vec<&str> = host.split('.').collect();
    let (index, region) = find_s3_label(&labels)
        .ok_or_else(|| Error::InvalidUri(format!("Not an S3 URI: {uri}")))?;

    let region = if region == "amazonaws" {
        DEFAULT_REGION.to_string()
    } else {
        region
    };
    let path = url.path().trim_start_matches('/');

    if index == 0 {
        // Path style: bucket is the first path segment
        let (bucket, key) = path.split_once('/').unwrap_or((path, ""));
        Ok(S3Uri {
            bucket: non_empty(bucket),
            key: decode_key(key)?,
            region: Some(region),
        })
    } else {
        Ok(S3Uri {
            bucket: non_empty(&labels[..index].join(".")),
            key: decode_key(path)?,
            region: Some(region),
        })
    }
}
