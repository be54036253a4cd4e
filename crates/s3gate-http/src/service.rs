//! The gateway's hyper service.
//!
//! [`GatewayService`] wraps the dispatcher for use with hyper:
//!
//! 1. Health check interception (`GET /_health`)
//! 2. Classification against the [`OperationCatalog`]
//! 3. Body collection, only for backend-bound operations
//! 4. Dispatch to the [`S3Backend`]
//! 5. Common response headers (`x-amz-request-id`, `Server`)
//!
//! Every other method, `OPTIONS` included, goes through classification and
//! gets the `MethodNotAllowed` document when no operation accepts it.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::HeaderValue;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use s3gate_model::error::S3Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::body::GatewayBody;
use crate::catalog::{Binding, OperationCatalog};
use crate::dispatch::{MatchResult, S3Backend, classify, dispatch_operation, no_match_error};
use crate::request::S3RequestView;
use crate::response::{error_to_response, not_found_response};

/// Path answered by the liveness check. Underscores are not valid in bucket
/// names, so this never shadows a path-style bucket.
pub const HEALTH_PATH: &str = "/_health";

const SERVER_NAME: &str = "s3gate";

/// Hyper service classifying and dispatching S3 requests.
pub struct GatewayService<H: S3Backend> {
    backend: Arc<H>,
    catalog: OperationCatalog,
}

impl<H: S3Backend> GatewayService<H> {
    /// Wrap `backend` behind `catalog`.
    #[must_use]
    pub fn new(backend: H, catalog: OperationCatalog) -> Self {
        Self {
            backend: Arc::new(backend),
            catalog,
        }
    }
}

impl<H: S3Backend> Clone for GatewayService<H> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            catalog: self.catalog.clone(),
        }
    }
}

impl<H: S3Backend> fmt::Debug for GatewayService<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayService")
            .field("operations", &self.catalog.len())
            .field("domain_suffix", &self.catalog.domain_suffix())
            .finish_non_exhaustive()
    }
}

impl<H: S3Backend> Service<http::Request<Incoming>> for GatewayService<H> {
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

impl<H: S3Backend> GatewayService<H> {
    /// Run one request through the gateway. Never fails: every outcome is
    /// turned into a response.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<GatewayBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let request_id = Uuid::new_v4().to_string();
        let response = self.process_request(req, &request_id).await;
        add_common_headers(response, &request_id)
    }

    async fn process_request<B>(
        &self,
        req: http::Request<B>,
        request_id: &str,
    ) -> http::Response<GatewayBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: fmt::Display,
    {
        let (parts, body) = req.into_parts();
        debug!(method = %parts.method, uri = %parts.uri, request_id, "received S3 request");

        if is_health_check(&parts.method, parts.uri.path()) {
            return health_check_response();
        }

        let view = S3RequestView::from_parts(&parts);
        let (operation, binding, params) = match classify(&self.catalog, &view) {
            MatchResult::Matched {
                operation,
                binding,
                params,
            } => (operation, binding, params),
            MatchResult::NoMatch { address } => {
                let err = no_match_error(&view, &address);
                debug!(error = %err, request_id, "answering unmatched request");
                return not_found_response(view.path(), request_id);
            }
        };

        let body = match binding {
            Binding::Backend => match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    error!(error = %err, request_id, "failed to collect request body");
                    let s3_err = S3Error::internal_error("Failed to read request body");
                    return error_to_response(&s3_err, request_id);
                }
            },
            Binding::NotImplemented => Bytes::new(),
        };

        match dispatch_operation(self.backend.as_ref(), operation, binding, params, body).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, request_id, "S3 operation returned error");
                error_to_response(&S3Error::from(err), request_id)
            }
        }
    }
}

fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == HEALTH_PATH
}

fn health_check_response() -> http::Response<GatewayBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(GatewayBody::from(r#"{"status":"running","service":"s3gate"}"#))
        .expect("static health response should be valid")
}

fn add_common_headers(
    mut response: http::Response<GatewayBody>,
    request_id: &str,
) -> http::Response<GatewayBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv);
    }
    headers.insert(http::header::SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}
