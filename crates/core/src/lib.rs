//! ru-core: Core library for the render-upload action
//!
//! This crate provides the core functionality for render-upload, including:
//! - Transfer parameters and credential resolution
//! - The per-target client cache
//! - Upload and download operations over an abstract object transport
//! - The post-render action entry point and its configuration
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod action;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod download;
pub mod error;
pub mod job;
pub mod output_url;
pub mod params;
pub mod traits;
pub mod transfer;
pub mod upload;
pub mod uri;

pub use action::{ActionHooks, ActionOptions, Rejected, SUPPORTED_MODE, UploadAction};
pub use cache::ClientCache;
pub use config::{Config, ConfigManager};
pub use credentials::{CredentialResolver, CredentialSource, CredentialSpec};
pub use download::DownloadOutcome;
pub use error::{Error, MissingParameter, Result};
pub use job::{Job, Logger, ProgressObserver, Settings, TracingLogger};
pub use params::{CredentialParams, Tag, TransferParams};
pub use traits::{ObjectBody, ObjectTransport, PutObjectOutput, PutObjectRequest, Target, TransportFactory};
pub use transfer::{TransportCache, Transfers};
pub use upload::UploadOutcome;
pub use uri::{ObjectLocation, S3Uri, parse_s3_uri};
