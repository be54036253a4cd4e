//! Bucket addressing: virtual-hosted-style vs path-style resolution.
//!
//! With a domain suffix of `s3.example.com`:
//!
//! ```text
//! Host: photos.s3.example.com   GET /2024/cat.jpg  -> ("photos", "2024/cat.jpg")
//! Host: s3.example.com          GET /photos/cat.jpg -> ("photos", "cat.jpg")
//! ```
//!
//! The virtual-hosted form is tried first and wins whenever the Host carries
//! the suffix, even if the path would also parse as a path-style route. A
//! virtual-hosted path consisting only of the bucket name again (`/photos` on
//! `photos.s3.example.com`) addresses the bucket root. With a trailing slash
//! (`/photos/`) it stays the object key `photos/`.

use crate::request::decode_uri_component;

/// Which of the two S3 addressing styles produced a [`BucketAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingStyle {
    /// Bucket taken from the Host subdomain.
    VirtualHosted,
    /// Bucket taken from the first path segment.
    Path,
}

/// The `(bucket, key)` pair a request targets.
///
/// An empty bucket with an empty key addresses the service itself. An empty
/// bucket label is malformed and can never match a bucket or object
/// operation; with an empty key it still reaches the service root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketAddress {
    bucket: String,
    key: String,
    style: AddressingStyle,
}

impl BucketAddress {
    /// Build an address directly.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, style: AddressingStyle) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            style,
        }
    }

    /// The bucket name; empty for service-level or malformed requests.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object key; empty for bucket-root requests.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How the bucket was located.
    #[must_use]
    pub fn style(&self) -> AddressingStyle {
        self.style
    }

    /// Service-level request: no bucket and no key.
    #[must_use]
    pub fn is_service(&self) -> bool {
        self.bucket.is_empty() && self.key.is_empty()
    }

    /// The bucket label came out empty although the request named one: a
    /// virtual host with nothing before the suffix, or a key with no bucket.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.bucket.is_empty()
            && (self.style == AddressingStyle::VirtualHosted || !self.key.is_empty())
    }
}

/// Resolve the bucket and key a request addresses.
///
/// `host` may carry a port, which is ignored. `domain_suffix` of `None` or
/// `""` disables virtual-hosted-style addressing entirely.
#[must_use]
pub fn resolve(host: Option<&str>, path: &str, domain_suffix: Option<&str>) -> BucketAddress {
    let virtual_bucket = domain_suffix
        .filter(|suffix| !suffix.is_empty())
        .zip(host)
        .and_then(|(suffix, host)| virtual_host_bucket(strip_port(host), suffix));

    if let Some(bucket) = virtual_bucket {
        let raw_key = path.strip_prefix('/').unwrap_or(path);
        let mut key = decode_uri_component(raw_key);
        if !bucket.is_empty() && key == bucket {
            key.clear();
        }
        return BucketAddress::new(bucket, key, AddressingStyle::VirtualHosted);
    }

    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (bucket, key) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    BucketAddress::new(
        decode_uri_component(bucket),
        decode_uri_component(key),
        AddressingStyle::Path,
    )
}

/// Match `host` against `{bucket}.{suffix}`, case-insensitively on the suffix.
/// The bucket label may itself contain dots.
fn virtual_host_bucket<'h>(host: &'h str, suffix: &str) -> Option<&'h str> {
    let host = host.strip_suffix('.').unwrap_or(host);
    let dot = host.len().checked_sub(suffix.len() + 1)?;
    if !host.is_char_boundary(dot) {
        return None;
    }
    let (label, tail) = host.split_at(dot);
    let tail = tail.strip_prefix('.')?;
    tail.eq_ignore_ascii_case(suffix).then_some(label)
}

/// Drop a trailing `:port`, leaving bracketed IPv6 literals intact.
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => host,
    }
}
