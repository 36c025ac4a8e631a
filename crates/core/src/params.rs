//! Transfer parameters
//!
//! Describes where an object goes (region or endpoint, bucket, key) and how
//! it is stored (ACL, content type, metadata, tags).

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, MissingParameter, Result};

/// Content type used when none is configured
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

/// Explicit credential parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialParams {
    /// Named profile from the local AWS configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Access key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    /// Secret access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

impl CredentialParams {
    /// Credentials naming a local profile
    pub fn profile(name: impl Into<String>) -> Self {
        Self {
            profile: Some(name.into()),
            ..Default::default()
        }
    }

    /// Credentials carrying an explicit key pair
    pub fn keys(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            profile: None,
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
        }
    }
}

/// Describes the target of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    /// AWS region, used when no endpoint is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Custom endpoint URL for S3-compatible providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Canned ACL, e.g. "public-read"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,

    #[serde(default = "default_content_type", alias = "ContentType")]
    pub content_type: String,

    /// User metadata attached to the object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialParams>,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            bucket: None,
            key: None,
            acl: None,
            content_type: default_content_type(),
            metadata: None,
            credentials: None,
        }
    }
}

/// Treats empty strings the same as absent values
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl TransferParams {
    pub fn region(&self) -> Option<&str> {
        present(&self.region)
    }

    pub fn endpoint(&self) -> Option<&str> {
        present(&self.endpoint)
    }

    pub fn bucket(&self) -> Option<&str> {
        present(&self.bucket)
    }

    pub fn key(&self) -> Option<&str> {
        present(&self.key)
    }

    pub fn acl(&self) -> Option<&str> {
        present(&self.acl)
    }

    /// Fill unset fields from `other`
    ///
    /// Values already present on `self` win. Used to layer command-line
    /// flags over a configuration file. `content_type` is always present, so
    /// it is kept from `self`; callers choose it before layering.
    pub fn or(mut self, other: TransferParams) -> Self {
        self.region = self.region.or(other.region);
        self.endpoint = self.endpoint.or(other.endpoint);
        self.bucket = self.bucket.or(other.bucket);
        self.key = self.key.or(other.key);
        self.acl = self.acl.or(other.acl);
        self.metadata = self.metadata.or(other.metadata);
        self.credentials = self.credentials.or(other.credentials);
        self
    }

    /// Check the fields an upload cannot proceed without
    ///
    /// Checked in a fixed order so that each missing field yields a stable
    /// message.
    pub fn validate_upload(&self) -> Result<UploadTarget<'_>> {
        if self.endpoint().is_none() && self.region().is_none() {
            return Err(MissingParameter::RegionOrEndpoint.into());
        }
        let bucket = self.bucket().ok_or(MissingParameter::Bucket)?;
        let key = self.key().ok_or(MissingParameter::Key)?;
        let acl = self.acl().ok_or(MissingParameter::Acl)?;
        Ok(UploadTarget { bucket, key, acl })
    }
}

/// Validated upload coordinates borrowed from [`TransferParams`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTarget<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub acl: &'a str,
}

/// Tag attached to an uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl FromStr for Tag {
    type Err = Error;

    /// Parse `KEY=VALUE`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(Tag::new(key, value)),
            _ => Err(Error::Config(format!(
                "Invalid tag '{s}', expected KEY=VALUE"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_params() -> TransferParams {
        TransferParams {
            region: Some("us-east-1".into()),
            bucket: Some("b".into()),
            key: Some("k".into()),
            acl: Some("public-read".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_content_type() {
        assert_eq!(TransferParams::default().content_type, "video/mp4");
        let parsed: TransferParams = serde_json::from_str(r#"{"bucket":"b"}"#).unwrap();
        assert_eq!(parsed.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_deserialize_camel_case_and_alias() {
        let json = r#"{
            "region": "eu-west-1",
            "bucket": "renders",
            "key": "out/final.mp4",
            "acl": "public-read",
            "ContentType": "video/quicktime",
            "metadata": {"job": "42"},
            "credentials": {"accessKeyId": "AK", "secretAccessKey": "SK"}
        }"#;
        let params: TransferParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.content_type, "video/quicktime");
        assert_eq!(params.metadata.unwrap()["job"], "42");
        assert_eq!(params.credentials, Some(CredentialParams::keys("AK", "SK")));
    }

    #[test]
    fn test_validate_upload_ok() {
        let params = full_params();
        let target = params.validate_upload().unwrap();
        assert_eq!(target.bucket, "b");
        assert_eq!(target.key, "k");
        assert_eq!(target.acl, "public-read");
    }

    #[test]
    fn test_validate_upload_order() {
        let mut params = TransferParams::default();
        let err = params.validate_upload().unwrap_err();
        assert_eq!(err.to_string(), "S3 region or endpoint not provided.");

        params.endpoint = Some("https://example-endpoint.com".into());
        let err = params.validate_upload().unwrap_err();
        assert_eq!(err.to_string(), "S3 bucket not provided.");

        params.bucket = Some("b".into());
        let err = params.validate_upload().unwrap_err();
        assert_eq!(err.to_string(), "S3 key not provided.");

        params.key = Some("k".into());
        let err = params.validate_upload().unwrap_err();
        assert_eq!(err.to_string(), "S3 ACL not provided.");
    }

    #[test]
    fn test_empty_strings_are_missing() {
        let mut params = full_params();
        params.acl = Some(String::new());
        assert!(matches!(
            params.validate_upload(),
            Err(Error::MissingParameter(MissingParameter::Acl))
        ));
    }

    #[test]
    fn test_or_prefers_self() {
        let flags = TransferParams {
            key: Some("flag-key".into()),
            ..Default::default()
        };
        let file = TransferParams {
            content_type: "image/png".into(),
            ..full_params()
        };
        let merged = flags.or(file);
        assert_eq!(merged.key(), Some("flag-key"));
        assert_eq!(merged.bucket(), Some("b"));
        assert_eq!(merged.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_tag_from_str() {
        let tag: Tag = "deleteAfter90Days=90 Days".parse().unwrap();
        assert_eq!(tag, Tag::new("deleteAfter90Days", "90 Days"));
        assert!("novalue".parse::<Tag>().is_err());
        assert!("=value".parse::<Tag>().is_err());
    }

    #[test]
    fn test_tag_serde_names() {
        let tag = Tag::new("a", "b");
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, r#"{"Key":"a","Value":"b"}"#);
    }
}
