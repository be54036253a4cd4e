//! Integration tests for the s3gate server.
//!
//! These tests require a running `s3gate-server` at `localhost:8333`, started
//! with `S3_DOMAIN_NAME=s3.localhost`. They are marked `#[ignore]` so they
//! don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p s3gate-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

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
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8333".to_owned())
}

/// Virtual-host suffix the server was started with.
#[must_use]
pub fn domain_name() -> String {
    std::env::var("S3_DOMAIN_NAME").unwrap_or_else(|_| "s3.localhost".to_owned())
}

/// Plain HTTP client for inspecting raw responses.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Create an S3 client pointing at the local server, path-style addressing.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();
    let creds = Credentials::new("test", "test", None, None, "integration-test");
    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

mod test_routing;
mod test_sdk;
