//! S3 transport implementation
//!
//! Wraps aws-sdk-s3 and implements the transport traits from ru-core.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::default_provider::region::DefaultRegionChain;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use futures::TryStreamExt;
use http_body::Frame;
use http_body_util::StreamBody;
use tokio_util::io::ReaderStream;

use ru_core::uri::DEFAULT_REGION;
use ru_core::{
    CredentialSpec, Error, ObjectBody, ObjectTransport, PutObjectOutput, PutObjectRequest, Result,
    Tag, Target, TransportFactory,
};

/// Provider name attached to static credentials
const STATIC_PROVIDER: &str = "render-upload-static-credentials";

/// S3 transport wrapper
pub struct S3Transport {
    inner: aws_sdk_s3::Client,
}

impl S3Transport {
    /// Create a transport for `target` using `credentials`
    ///
    /// Region-less targets defer to the SDK's region chain and fall back to
    /// us-east-1. Retries are disabled; a failed request fails the transfer.
    pub async fn new(target: &Target, credentials: &CredentialSpec) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled());

        loader = loader.region(region_chain(target, credentials));
        if let Target::Endpoint(endpoint) = target {
            loader = loader.endpoint_url(endpoint);
        }

        loader = match credentials {
            CredentialSpec::Profile(name) => loader.profile_name(name),
            CredentialSpec::Static {
                access_key_id,
                secret_access_key,
            } => loader.credentials_provider(aws_credential_types::Credentials::new(
                access_key_id,
                secret_access_key,
                None, // session token
                None, // expiry
                STATIC_PROVIDER,
            )),
            CredentialSpec::Ambient => loader,
        };

        let config = loader.load().await;
        tracing::debug!(%target, region = ?config.region(), "Built S3 client");

        // Virtual-host addressing, matching the public URLs handed back to jobs
        let s3_config = aws_sdk_s3::config::Builder::from(&config).build();

        Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        }
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

/// Region for `target`: the explicit one, then the SDK chain, then us-east-1
///
/// When credentials name a profile, the chain reads that profile's region.
fn region_chain(target: &Target, credentials: &CredentialSpec) -> RegionProviderChain {
    let explicit = match target {
        Target::Region(region) => region.clone().map(Region::new),
        Target::Endpoint(_) => None,
    };
    let mut sdk_chain = DefaultRegionChain::builder();
    if let CredentialSpec::Profile(name) = credentials {
        sdk_chain = sdk_chain.profile_name(name);
    }
    RegionProviderChain::first_try(explicit)
        .or_else(sdk_chain.build())
        .or_else(Region::new(DEFAULT_REGION))
}

/// Encode tags as the URL query string `put_object` expects
fn encode_tags(tags: &[Tag]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for tag in tags {
        query.append_pair(&tag.key, &tag.value);
    }
    Some(query.finish())
}

/// Map an S3 error code onto the core error taxonomy
fn classify(code: Option<&str>, message: String, subject: &str) -> Error {
    match code {
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => Error::NotFound(subject.to_string()),
        Some(
            "AccessDenied"
            | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch"
            | "ExpiredToken"
            | "InvalidToken",
        ) => Error::Credentials(message),
        _ => Error::Network(message),
    }
}

fn map_sdk_error<E>(err: E, subject: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    classify(err.code(), message, subject)
}

#[async_trait]
impl ObjectTransport for S3Transport {
    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectOutput> {
        let subject = format!("{}/{}", request.bucket, request.key);
        let content_length = i64::try_from(request.content_length)
            .map_err(|_| Error::Io(std::io::Error::other("Object too large")))?;

        let frames = ReaderStream::new(request.body).map_ok(Frame::data);
        let body = ByteStream::from_body_1_x(StreamBody::new(frames));

        let mut put = self
            .inner
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .acl(ObjectCannedAcl::from(request.acl.as_str()))
            .content_type(&request.content_type)
            .content_length(content_length)
            .body(body);

        if !request.metadata.is_empty() {
            put = put.set_metadata(Some(request.metadata.into_iter().collect()));
        }
        if let Some(tagging) = encode_tags(&request.tags) {
            put = put.tagging(tagging);
        }

        let response = put
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &subject))?;

        Ok(PutObjectOutput {
            // Single-part puts carry no location header
            location: None,
            etag: response.e_tag().map(str::to_string),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        let content_length = response
            .content_length()
            .and_then(|len| u64::try_from(len).ok());

        Ok(ObjectBody {
            reader: Box::pin(response.body.into_async_read()),
            content_length,
        })
    }
}

/// Builds an [`S3Transport`] per target
#[derive(Debug, Default, Clone, Copy)]
pub struct S3TransportFactory;

#[async_trait]
impl TransportFactory for S3TransportFactory {
    async fn connect(
        &self,
        target: &Target,
        credentials: &CredentialSpec,
    ) -> Result<Arc<dyn ObjectTransport>> {
        let transport: Arc<dyn ObjectTransport> =
            Arc::new(S3Transport::new(target, credentials).await);
        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::meta::region::ProvideRegion;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_explicit_region_wins() {
        let target = Target::Region(Some("ap-south-1".into()));
        let chain = region_chain(&target, &CredentialSpec::Profile("farm".into()));
        assert_eq!(chain.region().await, Some(Region::new("ap-south-1")));
    }

    // Only test in this crate that touches the process environment
    #[tokio::test]
    async fn test_endpoint_target_reads_profile_region() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        std::fs::write(
            &config,
            "[default]\nregion = us-west-2\n\n[profile farm] # render farm\nregion = eu-north-1\n",
        )
        .unwrap();
        unsafe {
            std::env::remove_var("AWS_REGION");
            std::env::remove_var("AWS_DEFAULT_REGION");
            std::env::set_var("AWS_CONFIG_FILE", &config);
            std::env::set_var("AWS_SHARED_CREDENTIALS_FILE", dir.path().join("credentials"));
        }

        let target = Target::Endpoint("https://nyc3.example.com".into());
        let chain = region_chain(&target, &CredentialSpec::Profile("farm".into()));
        assert_eq!(chain.region().await, Some(Region::new("eu-north-1")));
    }

    #[test]
    fn test_encode_tags() {
        assert_eq!(encode_tags(&[]), None);
        let tags = vec![Tag::new("project", "trailer 2"), Tag::new("a&b", "c=d")];
        assert_eq!(
            encode_tags(&tags).as_deref(),
            Some("project=trailer+2&a%26b=c%3Dd")
        );
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify(Some("NoSuchKey"), "missing".into(), "b/k");
        assert!(matches!(err, Error::NotFound(ref s) if s == "b/k"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_classify_auth() {
        let err = classify(Some("InvalidAccessKeyId"), "bad key".into(), "b/k");
        assert!(matches!(err, Error::Credentials(_)));
    }

    #[test]
    fn test_classify_other() {
        let err = classify(None, "dispatch failure".into(), "b/k");
        assert!(matches!(err, Error::Network(ref s) if s == "dispatch failure"));
        let err = classify(Some("SlowDown"), "slow".into(), "b/k");
        assert!(matches!(err, Error::Network(_)));
    }
}
