//! Integration tests for the ru CLI
//!
//! Tests that transfer data require an S3-compatible server reachable with
//! virtual-host addressing and an existing bucket.
//!
//! Run with:
//! ```bash
//! export TEST_S3_ENDPOINT=https://nyc3.example.com
//! export TEST_S3_ACCESS_KEY=accesskey
//! export TEST_S3_SECRET_KEY=secretkey
//! export TEST_S3_BUCKET=render-upload-tests
//! cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Get the path to the ru binary
fn ru_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ru"))
}

/// Run ru with a config file isolated inside `dir`
fn run_ru(args: &[&str], dir: &Path) -> Output {
    let config = dir.join("config.toml");
    Command::new(ru_binary())
        .args(args)
        .arg("--config")
        .arg(&config)
        .env_remove("AWS_PROFILE")
        .output()
        .expect("Failed to execute ru command")
}

/// Get S3 test configuration from environment
fn get_test_config() -> Option<(String, String, String, String)> {
    let endpoint = std::env::var("TEST_S3_ENDPOINT").ok()?;
    let access_key = std::env::var("TEST_S3_ACCESS_KEY").ok()?;
    let secret_key = std::env::var("TEST_S3_SECRET_KEY").ok()?;
    let bucket = std::env::var("TEST_S3_BUCKET").ok()?;
    Some((endpoint, access_key, secret_key, bucket))
}

/// Generate unique suffix for test resources
fn uuid_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:x}", duration.as_nanos() % 0xFFFFFFFF)
}

/// Write a job file whose output is `output` inside the job's workpath
fn write_job(dir: &Path, output: &str) -> PathBuf {
    let job = serde_json::json!({
        "uid": format!("it-{}", uuid_suffix()),
        "workpath": dir,
        "output": output,
    });
    let path = dir.join("job.json");
    std::fs::write(&path, serde_json::to_string_pretty(&job).unwrap()).unwrap();
    path
}

mod validation {
    use super::*;

    #[test]
    fn test_wrong_mode_exits_unsupported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("out.mp4"), b"x").unwrap();
        let job = write_job(dir.path(), "out.mp4");

        let output = run_ru(
            &[
                "upload",
                "--job",
                job.to_str().unwrap(),
                "--mode",
                "prerender",
            ],
            dir.path(),
        );

        assert_eq!(output.status.code(), Some(7));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains(
            "Action render-upload can be only run in postrender mode, you provided: prerender."
        ));
    }

    #[test]
    fn test_missing_region_exits_usage() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("out.mp4"), b"x").unwrap();
        let job = write_job(dir.path(), "out.mp4");

        let output = run_ru(
            &["upload", "--job", job.to_str().unwrap(), "--bucket", "b"],
            dir.path(),
        );

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("S3 region or endpoint not provided."));
    }

    #[test]
    fn test_download_missing_key_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("staged.bin");

        let output = run_ru(
            &["download", "s3://bucket-only", dest.to_str().unwrap()],
            dir.path(),
        );

        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8_lossy(&output.stderr).contains("S3 key not provided."));
        assert!(!dest.exists());
    }

    #[test]
    fn test_download_digital_ocean_rejected() {
        let dir = TempDir::new().unwrap();
        let output = run_ru(
            &[
                "download",
                "https://b.nyc3.digitaloceanspaces.com/k",
                dir.path().join("k").to_str().unwrap(),
            ],
            dir.path(),
        );
        assert_eq!(output.status.code(), Some(7));
    }
}

mod transfers {
    use super::*;

    #[test]
    fn test_upload_write_back_and_download() {
        let (endpoint, access_key, secret_key, bucket) = match get_test_config() {
            Some(c) => c,
            None => {
                eprintln!("Skipping: S3 test config not available");
                return;
            }
        };

        let dir = TempDir::new().unwrap();
        let content = b"rendered frames";
        std::fs::write(dir.path().join("result.mp4"), content).unwrap();
        let job = write_job(dir.path(), "result.mp4");
        let key = format!("ru-it/{}/result.mp4", uuid_suffix());

        let output = run_ru(
            &[
                "upload",
                "--json",
                "--job",
                job.to_str().unwrap(),
                "--endpoint",
                &endpoint,
                "--access-key",
                &access_key,
                "--secret-key",
                &secret_key,
                "--bucket",
                &bucket,
                "--key",
                &key,
                "--acl",
                "private",
                "--tag",
                "suite=integration",
                "--write-back",
            ],
            dir.path(),
        );
        assert!(
            output.status.success(),
            "Failed to upload: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let stdout: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(stdout["status"], "success");
        let url = stdout["url"].as_str().unwrap().to_string();
        assert!(url.ends_with(&format!("/{key}")));

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&job).unwrap()).unwrap();
        assert_eq!(saved["output"], url.as_str());

        let dest = dir.path().join("staged/result.mp4");
        let output = run_ru(
            &[
                "download",
                &format!("s3://{bucket}/{key}"),
                dest.to_str().unwrap(),
                "--endpoint",
                &endpoint,
                "--access-key",
                &access_key,
                "--secret-key",
                &secret_key,
            ],
            dir.path(),
        );
        assert!(
            output.status.success(),
            "Failed to download: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(std::fs::read(&dest).unwrap(), content);
    }

    #[test]
    fn test_download_missing_object_exits_not_found() {
        let (endpoint, access_key, secret_key, bucket) = match get_test_config() {
            Some(c) => c,
            None => {
                eprintln!("Skipping: S3 test config not available");
                return;
            }
        };

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing.bin");
        let output = run_ru(
            &[
                "download",
                &format!("s3://{bucket}/ru-it/does-not-exist-{}", uuid_suffix()),
                dest.to_str().unwrap(),
                "--endpoint",
                &endpoint,
                "--access-key",
                &access_key,
                "--secret-key",
                &secret_key,
            ],
            dir.path(),
        );

        assert_eq!(output.status.code(), Some(5));
        assert!(!dest.exists());
    }
}
