//! ru-s3: S3 SDK adapter for render-upload
//!
//! This crate provides the implementation of the transport traits
//! using the aws-sdk-s3 crate. It is the only crate that directly
//! depends on the AWS SDK.

pub mod client;

pub use client::{S3Transport, S3TransportFactory};
