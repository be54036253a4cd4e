//! Gateway configuration.
//!
//! [`GatewayConfig`] is loaded from environment variables; anything unset
//! keeps its default.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Gateway configuration.
///
/// # Examples
///
/// ```
/// use s3gate_http::config::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .domain_name(Some("s3.example.com".to_owned()))
///     .build();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8333");
/// assert_eq!(config.virtual_host_suffix(), Some("s3.example.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Bind address (e.g. `"0.0.0.0:8333"`).
    #[builder(default = String::from("0.0.0.0:8333"))]
    pub gateway_listen: String,

    /// Domain suffix for virtual-hosted-style addressing. `None` or empty
    /// turns it off.
    #[builder(default)]
    pub domain_name: Option<String>,

    /// Filer directory holding one sub-directory per bucket.
    #[builder(default = String::from("/buckets"))]
    pub buckets_path: String,

    /// Filer address requests are ultimately served by.
    #[builder(default = String::from("localhost:8888"))]
    pub filer: String,

    /// Log level filter string (e.g. `"info"`, `"s3gate_http=debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8333` |
    /// | `S3_DOMAIN_NAME` | *(unset)* |
    /// | `S3_BUCKETS_PATH` | `/buckets` |
    /// | `S3_FILER` | `localhost:8888` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("S3_DOMAIN_NAME") {
            config.domain_name = Some(v);
        }
        if let Some(v) = lookup("S3_BUCKETS_PATH") {
            config.buckets_path = v;
        }
        if let Some(v) = lookup("S3_FILER") {
            config.filer = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The effective virtual-host suffix, if virtual-hosted style is on.
    #[must_use]
    pub fn virtual_host_suffix(&self) -> Option<&str> {
        self.domain_name
            .as_deref()
            .map(|d| d.trim_matches('.'))
            .filter(|d| !d.is_empty())
    }
}
