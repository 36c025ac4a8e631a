//! Transport trait definitions
//!
//! The object-storage protocol is an opaque capability: put an object from a
//! byte stream, get an object as a byte stream. Keeping it behind a trait
//! decouples the orchestration logic from the S3 SDK and lets it be faked
//! in tests.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::credentials::CredentialSpec;
use crate::error::Result;
use crate::params::Tag;

/// Streamed request body
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Sync>>;

/// Streamed response body
pub type ResponseReader = Pin<Box<dyn AsyncRead + Send>>;

/// What a transport client is configured to talk to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// AWS region; `None` leaves region discovery to the transport
    Region(Option<String>),
    /// Custom endpoint URL of an S3-compatible provider
    Endpoint(String),
}

impl Target {
    /// Endpoint wins over region when both are set
    pub fn select(region: Option<&str>, endpoint: Option<&str>) -> Self {
        match endpoint {
            Some(endpoint) => Target::Endpoint(endpoint.to_string()),
            None => Target::Region(region.map(str::to_string)),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Region(Some(region)) => write!(f, "region {region}"),
            Target::Region(None) => f.write_str("default region"),
            Target::Endpoint(endpoint) => write!(f, "endpoint {endpoint}"),
        }
    }
}

/// A single streamed put
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub acl: String,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
    pub tags: Vec<Tag>,
    pub body: ByteReader,
    /// Exact number of bytes `body` yields
    pub content_length: u64,
}

impl std::fmt::Debug for PutObjectRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutObjectRequest")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("acl", &self.acl)
            .field("content_type", &self.content_type)
            .field("metadata", &self.metadata)
            .field("tags", &self.tags)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Acknowledgement of a completed put
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Location reported by the transport, if any
    pub location: Option<String>,
    pub etag: Option<String>,
}

/// Body of a fetched object
pub struct ObjectBody {
    pub reader: ResponseReader,
    pub content_length: Option<u64>,
}

/// Authenticated get/put against an S3-compatible store
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    /// Upload an object, consuming the request body
    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectOutput>;

    /// Open an object for streaming
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody>;
}

/// Builds transport clients
///
/// Implemented by the S3 adapter and mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Construct a client for `target`, attaching non-ambient credentials
    async fn connect(
        &self,
        target: &Target,
        credentials: &CredentialSpec,
    ) -> Result<Arc<dyn ObjectTransport>>;
}
