//! Integration tests for BucketStack stacks.
//!
//! These tests deploy real stacks through [`S3Engine`] against an
//! S3-compatible server at `localhost:4566` (override with `S3_ENDPOINT_URL`).
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p bucketstack-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use bucketstack_core::AwsRegion;
use bucketstack_engine::S3Engine;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

fn credentials() -> Credentials {
    Credentials::new("test", "test", None, None, "integration-test")
}

/// Create an S3 client for `region` pointing at the local server.
#[must_use]
pub fn s3_client(region: &AwsRegion) -> aws_sdk_s3::Client {
    init_tracing();

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(credentials())
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Create an STS client for `region` pointing at the local server.
#[must_use]
pub fn sts_client(region: &AwsRegion) -> aws_sdk_sts::Client {
    init_tracing();

    let config = aws_sdk_sts::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(aws_sdk_sts::config::Region::new(region.to_string()))
        .credentials_provider(credentials())
        .endpoint_url(endpoint_url())
        .build();

    aws_sdk_sts::Client::from_conf(config)
}

/// Create a provisioning engine for `region` pointing at the local server.
#[must_use]
pub fn engine(region: &AwsRegion) -> S3Engine {
    S3Engine::from_clients(s3_client(region), sts_client(region))
}

/// Generate a unique base bucket name for a test.
#[must_use]
pub fn test_bucket_base(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Delete every object version and delete marker in a bucket, then the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    let Ok(resp) = client.list_object_versions().bucket(bucket).send().await else {
        return; // Bucket may not exist.
    };

    let versions = resp
        .versions()
        .iter()
        .map(|v| (v.key(), v.version_id()))
        .chain(resp.delete_markers().iter().map(|m| (m.key(), m.version_id())));
    for (key, version_id) in versions {
        if let Some(key) = key {
            let _ = client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .set_version_id(version_id.map(ToOwned::to_owned))
                .send()
                .await;
        }
    }

    let _ = client.delete_bucket().bucket(bucket).send().await;
}

mod test_bootstrap;
mod test_bucket_service;
