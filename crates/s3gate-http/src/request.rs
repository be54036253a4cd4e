//! Immutable view over the parts of an HTTP request the dispatcher looks at.

use http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;

/// The request as the dispatcher sees it: method, path, Host, headers and
/// parsed query parameters. Nothing here reads the body.
#[derive(Debug, Clone)]
pub struct S3RequestView<'a> {
    method: &'a Method,
    path: &'a str,
    host: Option<&'a str>,
    headers: &'a HeaderMap,
    query: Vec<(String, String)>,
}

impl<'a> S3RequestView<'a> {
    /// Assemble a view from its pieces; `query` is the raw query string.
    #[must_use]
    pub fn new(
        method: &'a Method,
        path: &'a str,
        host: Option<&'a str>,
        headers: &'a HeaderMap,
        query: &str,
    ) -> Self {
        Self {
            method,
            path,
            host,
            headers,
            query: parse_query_params(query),
        }
    }

    /// Build a view over request parts. The Host header is preferred; the URI
    /// authority is used for HTTP/2 requests that carry none.
    #[must_use]
    pub fn from_parts(parts: &'a http::request::Parts) -> Self {
        Self::from_components(&parts.method, &parts.uri, &parts.headers)
    }

    /// Build a view over a full request without touching its body.
    #[must_use]
    pub fn from_request<B>(req: &'a http::Request<B>) -> Self {
        Self::from_components(req.method(), req.uri(), req.headers())
    }

    fn from_components(method: &'a Method, uri: &'a http::Uri, headers: &'a HeaderMap) -> Self {
        let host = headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(http::uri::Authority::as_str));
        Self::new(method, uri.path(), host, headers, uri.query().unwrap_or(""))
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.method
    }

    /// The raw (still percent-encoded) URI path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path
    }

    /// The Host the client addressed, including any port.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host
    }

    /// All request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.headers
    }

    /// Query parameters in the order they were sent.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The value of the first occurrence of `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// A header value, if present and valid visible ASCII.
    #[must_use]
    pub fn header_value(&self, name: &http::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Decode a percent-encoded URI component.
pub(crate) fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into key-value pairs. A bare `key` is kept with an
/// empty value so that sub-resource markers like `?uploads` stay visible.
pub(crate) fn parse_query_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_query_component(key), decode_query_component(value)),
            None => (decode_query_component(pair), String::new()),
        })
        .collect()
}

/// Query components additionally encode spaces as `+`.
fn decode_query_component(s: &str) -> String {
    if s.contains('+') {
        decode_uri_component(&s.replace('+', " "))
    } else {
        decode_uri_component(s)
    }
}
