//! Route dispatch: classify a request against the catalog, then hand it to the
//! storage backend exactly once.
//!
//! Classification ([`classify`]) is a pure, synchronous scan that never looks
//! at the request body, so callers can decide whether to read the body at all.
//! [`dispatch_operation`] then either calls the [`S3Backend`] or, for stub
//! entries, answers `NotImplemented` without touching it.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::HeaderMap;
use s3gate_model::S3Operation;
use s3gate_model::error::S3Error;
use tracing::{debug, info, warn};

use crate::addressing::{self, AddressingStyle, BucketAddress};
use crate::body::GatewayBody;
use crate::catalog::{Binding, OperationCatalog};
use crate::matcher::matches;
use crate::request::S3RequestView;

/// Parameters extracted for a matched operation.
#[derive(Debug, Clone)]
pub struct OperationParams {
    /// Bucket name; empty for `ListBuckets`.
    pub bucket: String,
    /// Decoded object key; empty for bucket and service operations.
    pub key: String,
    /// Every query parameter, in request order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Route variables captured by the matching entry, in declaration order.
    pub vars: Vec<(&'static str, String)>,
    /// How the bucket was addressed.
    pub style: AddressingStyle,
}

impl OperationParams {
    /// A captured route variable.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of scanning the catalog.
#[derive(Debug, Clone)]
pub enum MatchResult {
    /// No entry accepted the request.
    NoMatch {
        /// The address the request resolved to.
        address: BucketAddress,
    },
    /// The first entry whose predicates all held.
    Matched {
        /// The selected operation.
        operation: S3Operation,
        /// Whether it is served or stubbed.
        binding: Binding,
        /// Extracted parameters.
        params: OperationParams,
    },
}

/// Reasons a request does not reach the backend, plus backend failures.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Nothing in the catalog accepts this request shape.
    #[error("no S3 operation matches {method} {path}")]
    NoMatch {
        /// Request method.
        method: http::Method,
        /// Request path.
        path: String,
    },
    /// The bucket label resolved empty; handled like [`DispatchError::NoMatch`].
    #[error("malformed bucket address for {path}")]
    MalformedAddress {
        /// Request path.
        path: String,
    },
    /// The operation is declared but has no implementation.
    #[error("operation {0} is not implemented")]
    NotImplemented(S3Operation),
    /// The backend reported an error.
    #[error(transparent)]
    Backend(#[from] S3Error),
}

impl From<DispatchError> for S3Error {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NoMatch { path, .. } | DispatchError::MalformedAddress { path } => {
                Self::method_not_allowed(path)
            }
            DispatchError::NotImplemented(op) => Self::not_implemented(op.as_str()),
            DispatchError::Backend(err) => err,
        }
    }
}

/// The storage collaborator a classified request is handed to.
///
/// Boxed futures keep the trait object-safe so the service can hold it behind
/// an `Arc`.
pub trait S3Backend: Send + Sync + 'static {
    /// Serve one classified request.
    fn handle_operation(
        &self,
        op: S3Operation,
        params: OperationParams,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<GatewayBody>, S3Error>> + Send>>;
}

/// A backend that serves nothing. Useful for exercising routing alone.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedBackend;

impl S3Backend for NotImplementedBackend {
    fn handle_operation(
        &self,
        op: S3Operation,
        _params: OperationParams,
        _body: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<GatewayBody>, S3Error>> + Send>> {
        Box::pin(async move { Err(S3Error::not_implemented(op.as_str())) })
    }
}

/// Find the first catalog entry accepting `request` and extract its parameters.
#[must_use]
pub fn classify(catalog: &OperationCatalog, request: &S3RequestView<'_>) -> MatchResult {
    let address = addressing::resolve(request.host(), request.path(), catalog.domain_suffix());

    let Some(entry) = catalog
        .entries()
        .iter()
        .find(|entry| matches(entry, request, &address))
    else {
        return MatchResult::NoMatch { address };
    };

    let vars = entry
        .extractor()
        .vars()
        .iter()
        .filter_map(|name| request.query_value(name).map(|v| (*name, v.to_owned())))
        .collect();

    info!(
        operation = %entry.operation(),
        bucket = address.bucket(),
        key = address.key(),
        style = ?address.style(),
        "classified S3 request"
    );

    MatchResult::Matched {
        operation: entry.operation(),
        binding: entry.binding(),
        params: OperationParams {
            bucket: address.bucket().to_owned(),
            key: address.key().to_owned(),
            query: request.query().to_vec(),
            headers: request.headers().clone(),
            vars,
            style: address.style(),
        },
    }
}

/// Turn a [`MatchResult::NoMatch`] into the matching error, telling a
/// malformed address apart from an unknown request shape.
#[must_use]
pub fn no_match_error(request: &S3RequestView<'_>, address: &BucketAddress) -> DispatchError {
    let path = request.path().to_owned();
    if address.is_malformed() {
        warn!(
            method = %request.method(),
            path = %path,
            host = ?request.host(),
            "malformed bucket address"
        );
        DispatchError::MalformedAddress { path }
    } else {
        warn!(method = %request.method(), path = %path, "no S3 operation matches request");
        DispatchError::NoMatch {
            method: request.method().clone(),
            path,
        }
    }
}

/// Invoke the backend for a classified request, or short-circuit a stub.
///
/// # Errors
///
/// [`DispatchError::NotImplemented`] for stub bindings and
/// [`DispatchError::Backend`] when the backend fails.
pub async fn dispatch_operation<H: S3Backend + ?Sized>(
    backend: &H,
    operation: S3Operation,
    binding: Binding,
    params: OperationParams,
    body: Bytes,
) -> Result<http::Response<GatewayBody>, DispatchError> {
    match binding {
        Binding::NotImplemented => {
            debug!(operation = %operation, "operation is a NotImplemented stub");
            Err(DispatchError::NotImplemented(operation))
        }
        Binding::Backend => {
            debug!(
                operation = %operation,
                bucket = %params.bucket,
                key = %params.key,
                "dispatching S3 operation"
            );
            Ok(backend.handle_operation(operation, params, body).await?)
        }
    }
}

/// Classify and dispatch a fully buffered request in one step.
///
/// # Errors
///
/// Any [`DispatchError`]; the body is only handed on when the request is bound
/// to the backend.
pub async fn dispatch<H: S3Backend + ?Sized>(
    backend: &H,
    catalog: &OperationCatalog,
    request: http::Request<Bytes>,
) -> Result<http::Response<GatewayBody>, DispatchError> {
    let (parts, body) = request.into_parts();
    let view = S3RequestView::from_parts(&parts);
    match classify(catalog, &view) {
        MatchResult::NoMatch { address } => Err(no_match_error(&view, &address)),
        MatchResult::Matched {
            operation,
            binding,
            params,
        } => dispatch_operation(backend, operation, binding, params, body).await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{Method, Request};
    use s3gate_model::S3ErrorCode;

    use super::*;

    fn classify_request(catalog: &OperationCatalog, req: &Request<()>) -> MatchResult {
        classify(catalog, &S3RequestView::from_request(req))
    }

    fn operation_of(catalog: &OperationCatalog, req: &Request<()>) -> Option<S3Operation> {
        match classify_request(catalog, req) {
            MatchResult::Matched { operation, .. } => Some(operation),
            MatchResult::NoMatch { .. } => None,
        }
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(())
            .expect("valid request")
    }

    fn req(method: Method, uri: &str) -> Request<()> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .expect("valid request")
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(S3Operation, OperationParams, Bytes)>>,
    }

    impl S3Backend for RecordingBackend {
        fn handle_operation(
            &self,
            op: S3Operation,
            params: OperationParams,
            body: Bytes,
        ) -> Pin<Box<dyn Future<Output = Result<http::Response<GatewayBody>, S3Error>> + Send>>
        {
            self.calls
                .lock()
                .expect("lock not poisoned")
                .push((op, params, body));
            Box::pin(async {
                Ok(http::Response::builder()
                    .status(http::StatusCode::OK)
                    .body(GatewayBody::empty())
                    .expect("valid response"))
            })
        }
    }

    #[test]
    fn test_should_route_bucket_get_variants() {
        let catalog = OperationCatalog::build(None);
        assert_eq!(operation_of(&catalog, &get("/photos")), Some(S3Operation::ListObjectsV1));
        assert_eq!(
            operation_of(&catalog, &get("/photos?list-type=2")),
            Some(S3Operation::ListObjectsV2)
        );
        assert_eq!(
            operation_of(&catalog, &get("/photos?uploads")),
            Some(S3Operation::ListMultipartUploads)
        );
        assert_eq!(
            operation_of(&catalog, &get("/photos?location")),
            Some(S3Operation::GetBucketLocation)
        );
        assert_eq!(
            operation_of(&catalog, &get("/photos?versions")),
            Some(S3Operation::ListObjectVersions)
        );
        assert_eq!(
            operation_of(&catalog, &get("/photos?prefix=a&delimiter=%2F")),
            Some(S3Operation::ListObjectsV1)
        );
    }

    #[test]
    fn test_should_fall_back_to_list_objects_v1_for_other_list_type() {
        let catalog = OperationCatalog::build(None);
        assert_eq!(
            operation_of(&catalog, &get("/photos?list-type=1")),
            Some(S3Operation::ListObjectsV1)
        );
    }

    #[test]
    fn test_should_route_copy_and_put_object() {
        let catalog = OperationCatalog::build(None);
        let copy = Request::builder()
            .method(Method::PUT)
            .uri("/dst/key")
            .header("X-Amz-Copy-Source", "/src/key")
            .body(())
            .expect("valid request");
        assert_eq!(operation_of(&catalog, &copy), Some(S3Operation::CopyObject));
        assert_eq!(
            operation_of(&catalog, &req(Method::PUT, "/dst/key")),
            Some(S3Operation::PutObject)
        );
    }

    #[test]
    fn test_should_not_treat_copy_source_without_separator_as_copy() {
        let catalog = OperationCatalog::build(None);
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/dst/key")
            .header("X-Amz-Copy-Source", "nokey")
            .body(())
            .expect("valid request");
        assert_eq!(operation_of(&catalog, &request), Some(S3Operation::PutObject));
    }

    #[test]
    fn test_should_route_upload_part_and_upload_part_copy() {
        let catalog = OperationCatalog::build(None);
        let part = req(Method::PUT, "/b/k?partNumber=3&uploadId=abc");
        match classify_request(&catalog, &part) {
            MatchResult::Matched {
                operation, params, ..
            } => {
                assert_eq!(operation, S3Operation::UploadPart);
                assert_eq!(params.var("partNumber"), Some("3"));
                assert_eq!(params.var("uploadId"), Some("abc"));
            }
            MatchResult::NoMatch { .. } => panic!("expected UploadPart"),
        }

        let part_copy = Request::builder()
            .method(Method::PUT)
            .uri("/b/k?partNumber=3&uploadId=abc")
            .header("x-amz-copy-source", "src%2Fkey")
            .body(())
            .expect("valid request");
        assert_eq!(
            operation_of(&catalog, &part_copy),
            Some(S3Operation::UploadPartCopy)
        );
    }

    #[test]
    fn test_should_route_object_sub_resources() {
        let catalog = OperationCatalog::build(None);
        let cases = [
            (Method::GET, "/b/k?uploadId=u", S3Operation::ListParts),
            (Method::GET, "/b/k?acl", S3Operation::GetObjectAcl),
            (Method::GET, "/b/k?tagging", S3Operation::GetObjectTagging),
            (Method::GET, "/b/k", S3Operation::GetObject),
            (Method::HEAD, "/b/k", S3Operation::HeadObject),
            (Method::POST, "/b/k?uploads", S3Operation::CreateMultipartUpload),
            (Method::POST, "/b/k?uploadId=u", S3Operation::CompleteMultipartUpload),
            (Method::DELETE, "/b/k?uploadId=u", S3Operation::AbortMultipartUpload),
            (Method::DELETE, "/b/k?tagging", S3Operation::DeleteObjectTagging),
            (Method::DELETE, "/b/k", S3Operation::DeleteObject),
            (Method::PUT, "/b/k?tagging", S3Operation::PutObjectTagging),
            (Method::PUT, "/b/k?acl", S3Operation::PutObjectAcl),
        ];
        for (method, uri, expected) in cases {
            assert_eq!(
                operation_of(&catalog, &req(method.clone(), uri)),
                Some(expected),
                "{method} {uri}"
            );
        }
    }

    #[test]
    fn test_should_route_bucket_write_operations() {
        let catalog = OperationCatalog::build(None);
        let cases = [
            (Method::PUT, "/b", S3Operation::CreateBucket),
            (Method::PUT, "/b?policy", S3Operation::PutBucketPolicy),
            (Method::PUT, "/b?versioning", S3Operation::PutBucketVersioning),
            (Method::DELETE, "/b", S3Operation::DeleteBucket),
            (Method::DELETE, "/b?tagging", S3Operation::DeleteBucketTagging),
            (Method::HEAD, "/b", S3Operation::HeadBucket),
            (Method::POST, "/b?delete", S3Operation::DeleteObjects),
        ];
        for (method, uri, expected) in cases {
            assert_eq!(
                operation_of(&catalog, &req(method.clone(), uri)),
                Some(expected),
                "{method} {uri}"
            );
        }
    }

    #[test]
    fn test_should_route_browser_form_post() {
        let catalog = OperationCatalog::build(None);
        let form = Request::builder()
            .method(Method::POST)
            .uri("/b")
            .header("Content-Type", "multipart/form-data; boundary=xyz")
            .body(())
            .expect("valid request");
        assert_eq!(operation_of(&catalog, &form), Some(S3Operation::PostObject));
        assert_eq!(operation_of(&catalog, &req(Method::POST, "/b")), None);
    }

    #[test]
    fn test_should_not_match_unsupported_method_on_bucket_root() {
        let catalog = OperationCatalog::build(None);
        assert!(matches!(
            classify_request(&catalog, &req(Method::PATCH, "/b")),
            MatchResult::NoMatch { .. }
        ));
    }

    #[test]
    fn test_should_route_list_buckets_only_at_service_root() {
        let catalog = OperationCatalog::build(None);
        assert_eq!(operation_of(&catalog, &get("/")), Some(S3Operation::ListBuckets));
        assert_eq!(operation_of(&catalog, &req(Method::PUT, "/")), None);
    }

    #[test]
    fn test_should_route_virtual_hosted_bucket_root() {
        let catalog = OperationCatalog::build(Some("s3.example.com"));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/photos")
            .header("Host", "photos.s3.example.com")
            .body(())
            .expect("valid request");
        match classify_request(&catalog, &request) {
            MatchResult::Matched {
                operation, params, ..
            } => {
                assert_eq!(operation, S3Operation::ListObjectsV1);
                assert_eq!(params.bucket, "photos");
                assert_eq!(params.key, "");
                assert_eq!(params.style, AddressingStyle::VirtualHosted);
            }
            MatchResult::NoMatch { .. } => panic!("expected ListObjectsV1"),
        }
    }

    #[test]
    fn test_should_use_virtual_host_bucket_whatever_the_path() {
        let catalog = OperationCatalog::build(Some("s3.example.com"));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/2024/cat.jpg")
            .header("Host", "photos.s3.example.com")
            .body(())
            .expect("valid request");
        match classify_request(&catalog, &request) {
            MatchResult::Matched {
                operation, params, ..
            } => {
                assert_eq!(operation, S3Operation::GetObject);
                assert_eq!(params.bucket, "photos");
                assert_eq!(params.key, "2024/cat.jpg");
            }
            MatchResult::NoMatch { .. } => panic!("expected GetObject"),
        }
    }

    #[test]
    fn test_should_not_match_malformed_virtual_host() {
        let catalog = OperationCatalog::build(Some("s3.example.com"));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/key")
            .header("Host", ".s3.example.com")
            .body(())
            .expect("valid request");
        let MatchResult::NoMatch { address } = classify_request(&catalog, &request) else {
            panic!("malformed address should not match");
        };
        assert!(address.is_malformed());
        let view = S3RequestView::from_request(&request);
        assert!(matches!(
            no_match_error(&view, &address),
            DispatchError::MalformedAddress { .. }
        ));

        let root = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header("Host", ".s3.example.com")
            .body(())
            .expect("valid request");
        assert_eq!(operation_of(&catalog, &root), Some(S3Operation::ListBuckets));
    }

    fn virtual_hosted(method: Method, uri: &str) -> Request<()> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Host", "photos.s3.example.com")
            .body(())
            .expect("valid request")
    }

    #[test]
    fn test_should_keep_folder_marker_under_repeated_bucket_segment() {
        let catalog = OperationCatalog::build(Some("s3.example.com"));
        for (method, expected) in [
            (Method::PUT, S3Operation::PutObject),
            (Method::DELETE, S3Operation::DeleteObject),
        ] {
            match classify_request(&catalog, &virtual_hosted(method.clone(), "/photos/")) {
                MatchResult::Matched {
                    operation, params, ..
                } => {
                    assert_eq!(operation, expected, "{method} /photos/");
                    assert_eq!(params.bucket, "photos");
                    assert_eq!(params.key, "photos/");
                }
                MatchResult::NoMatch { .. } => panic!("expected {expected} for {method}"),
            }
        }
    }

    #[test]
    fn test_should_treat_bare_repeated_bucket_segment_as_bucket_root() {
        let catalog = OperationCatalog::build(Some("s3.example.com"));
        assert_eq!(
            operation_of(&catalog, &virtual_hosted(Method::PUT, "/photos")),
            Some(S3Operation::CreateBucket)
        );
        assert_eq!(
            operation_of(&catalog, &virtual_hosted(Method::DELETE, "/photos")),
            Some(S3Operation::DeleteBucket)
        );
        assert_eq!(
            operation_of(&catalog, &virtual_hosted(Method::GET, "/photos")),
            Some(S3Operation::ListObjectsV1)
        );
    }

    #[test]
    fn test_should_classify_identically_across_builds() {
        let first = OperationCatalog::build(Some("s3.example.com"));
        let second = OperationCatalog::build(Some("s3.example.com"));
        for uri in ["/", "/b", "/b?uploads", "/b/k?uploadId=x", "/b/k", "/b?list-type=2"] {
            for method in [Method::GET, Method::PUT, Method::POST, Method::DELETE, Method::HEAD] {
                let request = req(method, uri);
                assert_eq!(operation_of(&first, &request), operation_of(&second, &request));
            }
        }
    }

    #[tokio::test]
    async fn test_should_invoke_backend_once_with_params_and_body() {
        let catalog = OperationCatalog::build(None);
        let backend = RecordingBackend::default();
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/bucket/dir/file.txt")
            .body(Bytes::from_static(b"payload"))
            .expect("valid request");

        let resp = dispatch(&backend, &catalog, request)
            .await
            .expect("backend response");
        assert_eq!(resp.status(), http::StatusCode::OK);

        let calls = backend.calls.lock().expect("lock not poisoned");
        assert_eq!(calls.len(), 1);
        let (op, params, body) = &calls[0];
        assert_eq!(*op, S3Operation::PutObject);
        assert_eq!(params.bucket, "bucket");
        assert_eq!(params.key, "dir/file.txt");
        assert_eq!(body.as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_should_not_invoke_backend_for_stub() {
        let catalog = OperationCatalog::build(None);
        let backend = RecordingBackend::default();
        let request = Request::builder()
            .method(Method::GET)
            .uri("/bucket?policy")
            .body(Bytes::new())
            .expect("valid request");

        let err = dispatch(&backend, &catalog, request)
            .await
            .expect_err("stub should fail");
        assert!(matches!(
            err,
            DispatchError::NotImplemented(S3Operation::GetBucketPolicy)
        ));
        assert!(backend.calls.lock().expect("lock not poisoned").is_empty());

        let s3_err = S3Error::from(err);
        assert_eq!(s3_err.code, S3ErrorCode::NotImplemented);
    }

    #[tokio::test]
    async fn test_should_report_no_match_as_method_not_allowed() {
        let catalog = OperationCatalog::build(None);
        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/bucket/key")
            .body(Bytes::new())
            .expect("valid request");

        let err = dispatch(&NotImplementedBackend, &catalog, request)
            .await
            .expect_err("no operation should match");
        assert!(matches!(err, DispatchError::NoMatch { .. }));

        let s3_err = S3Error::from(err);
        assert_eq!(s3_err.code, S3ErrorCode::MethodNotAllowed);
        assert_eq!(s3_err.resource.as_deref(), Some("/bucket/key"));
    }

    #[tokio::test]
    async fn test_should_surface_backend_errors() {
        let catalog = OperationCatalog::build(None);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/bucket/key")
            .body(Bytes::new())
            .expect("valid request");

        let err = dispatch(&NotImplementedBackend, &catalog, request)
            .await
            .expect_err("backend serves nothing");
        assert!(matches!(err, DispatchError::Backend(_)));
    }
}
