//! Public URL construction for uploaded objects
//!
//! Two shapes are produced:
//! - AWS: `https://s3-{region}.amazonaws.com/{bucket}/{key}`
//! - Custom endpoint: `{endpoint}/{key}` with the bucket prefixed to the host
//!   when the endpoint is `https`, i.e. `https://{bucket}.{host}/{key}`
//!
//! Consumers store and parse these strings, so the formats must not drift.

use crate::params::TransferParams;

const SECURE_SCHEME: &str = "https://";

/// Compute the public URL of the object described by `params`
///
/// Returns `None` when neither an endpoint nor a region is set.
pub fn build_output_url(params: &TransferParams) -> Option<String> {
    let bucket = params.bucket().unwrap_or_default();
    let key = params.key().unwrap_or_default();

    if let Some(endpoint) = params.endpoint() {
        let url = format!("{endpoint}/{key}");
        return Some(match url.strip_prefix(SECURE_SCHEME) {
            Some(rest) => format!("{SECURE_SCHEME}{bucket}.{rest}"),
            None => url,
        });
    }

    params
        .region()
        .map(|region| format!("https://s3-{region}.amazonaws.com/{bucket}/{key}"))
}

/// Pick the URL reported back to the job
///
/// The computed URL is authoritative. The transport-reported location is
/// only used when nothing could be computed, and gains an `https://` scheme
/// if it has none.
pub fn resolve_output_url(params: &TransferParams, reported: Option<&str>) -> Option<String> {
    build_output_url(params).or_else(|| {
        reported.map(|location| {
            if location.starts_with("http") {
                location.to_string()
            } else {
                format!("{SECURE_SCHEME}{location}")
            }
        })
    })
}
