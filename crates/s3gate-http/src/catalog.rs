//! The operation catalog: every S3 operation the gateway recognises, as an
//! ordered list of predicate records.
//!
//! Order is precedence. The dispatcher takes the first entry whose predicates
//! all hold, so:
//!
//! 1. object operations come before bucket operations, which come before the
//!    service-level `ListBuckets`;
//! 2. inside a group, an entry with an extra header or query requirement comes
//!    before the generic entry for the same method and path shape
//!    (`UploadPartCopy`, `CopyObject`, `UploadPart`, then `PutObject`).
//!
//! Operations the gateway does not serve yet are still declared, bound to
//! [`Binding::NotImplemented`], so a recognised request shape never falls
//! through to the not-found response.

use std::sync::{Arc, LazyLock};

use http::{HeaderName, Method};
use regex::Regex;
use s3gate_model::S3Operation;
use tracing::debug;

/// `x-amz-copy-source` must name a `bucket/key` pair, slash either literal or
/// percent-encoded.
static COPY_SOURCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/|%2F").expect("valid copy source regex"));

static MULTIPART_FORM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^multipart/form-data").expect("valid form content type regex"));

fn x_amz_copy_source() -> HeaderName {
    HeaderName::from_static("x-amz-copy-source")
}

/// Where the object key must be, for an entry to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathShape {
    /// No bucket and no key: `/`.
    Service,
    /// A bucket and an empty key: `/{bucket}`.
    BucketRoot,
    /// A bucket and a non-empty key, which may contain `/`.
    HasObject,
}

/// A condition on a single header or query parameter.
#[derive(Debug, Clone)]
pub enum ValueCondition {
    /// Present with any value, including empty.
    Present,
    /// Not present at all.
    Absent,
    /// Present with exactly this value.
    Equals(&'static str),
    /// Present and one or more ASCII digits.
    Digits,
    /// Present and the value contains a match of the regex.
    Matches(Regex),
}

impl ValueCondition {
    /// Evaluate against the value found for the key, if any.
    #[must_use]
    pub fn holds(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Absent, value) => value.is_none(),
            (_, None) => false,
            (Self::Present, Some(_)) => true,
            (Self::Equals(expected), Some(v)) => v == *expected,
            (Self::Digits, Some(v)) => !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()),
            (Self::Matches(re), Some(v)) => re.is_match(v),
        }
    }
}

/// A required header.
#[derive(Debug, Clone)]
pub struct HeaderPredicate {
    /// Header name.
    pub name: HeaderName,
    /// What its value must satisfy.
    pub condition: ValueCondition,
}

/// A query-string requirement.
#[derive(Debug, Clone)]
pub struct QueryPredicate {
    /// Query key, case-sensitive as in S3.
    pub key: &'static str,
    /// What its value must satisfy.
    pub condition: ValueCondition,
}

/// Which query values become named route variables of the matched operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterExtractor {
    vars: Vec<&'static str>,
}

impl ParameterExtractor {
    /// The query keys captured, in declaration order.
    #[must_use]
    pub fn vars(&self) -> &[&'static str] {
        &self.vars
    }
}

/// What happens once an entry matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Hand the request to the storage backend.
    Backend,
    /// Declared stub; answer `NotImplemented` without reaching the backend.
    NotImplemented,
}

/// One catalog record.
#[derive(Debug, Clone)]
pub struct OperationEntry {
    operation: S3Operation,
    method: Method,
    path_shape: PathShape,
    headers: Vec<HeaderPredicate>,
    query: Vec<QueryPredicate>,
    extractor: ParameterExtractor,
    binding: Binding,
}

impl OperationEntry {
    /// A backend-bound entry with no header or query requirements.
    #[must_use]
    pub fn new(operation: S3Operation, method: Method, path_shape: PathShape) -> Self {
        Self {
            operation,
            method,
            path_shape,
            headers: Vec::new(),
            query: Vec::new(),
            extractor: ParameterExtractor::default(),
            binding: Binding::Backend,
        }
    }

    /// Require a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, condition: ValueCondition) -> Self {
        self.headers.push(HeaderPredicate { name, condition });
        self
    }

    /// Require a query key.
    #[must_use]
    pub fn query(mut self, key: &'static str, condition: ValueCondition) -> Self {
        self.query.push(QueryPredicate { key, condition });
        self
    }

    /// Require a query key and capture its value as a route variable.
    #[must_use]
    pub fn query_var(mut self, key: &'static str, condition: ValueCondition) -> Self {
        self.extractor.vars.push(key);
        self.query(key, condition)
    }

    /// Bind the entry to the `NotImplemented` stub.
    #[must_use]
    pub fn not_implemented(mut self) -> Self {
        self.binding = Binding::NotImplemented;
        self
    }

    /// The operation this entry selects.
    #[must_use]
    pub fn operation(&self) -> S3Operation {
        self.operation
    }

    /// Required HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Required path shape.
    #[must_use]
    pub fn path_shape(&self) -> PathShape {
        self.path_shape
    }

    /// Header requirements.
    #[must_use]
    pub fn header_predicates(&self) -> &[HeaderPredicate] {
        &self.headers
    }

    /// Query requirements.
    #[must_use]
    pub fn query_predicates(&self) -> &[QueryPredicate] {
        &self.query
    }

    /// Route-variable extraction rule.
    #[must_use]
    pub fn extractor(&self) -> &ParameterExtractor {
        &self.extractor
    }

    /// Backend or stub.
    #[must_use]
    pub fn binding(&self) -> Binding {
        self.binding
    }
}

/// The immutable, ordered catalog plus the addressing configuration it was
/// built for. Cloning shares the entries.
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    entries: Arc<[OperationEntry]>,
    domain_suffix: Option<Arc<str>>,
}

impl OperationCatalog {
    /// Build the catalog. `domain_suffix` enables virtual-hosted-style
    /// addressing when set and non-empty; leading and trailing dots are
    /// ignored.
    #[must_use]
    pub fn build(domain_suffix: Option<&str>) -> Self {
        let domain_suffix = domain_suffix
            .map(|s| s.trim_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .map(Arc::from);

        let mut entries = object_entries();
        entries.extend(bucket_entries());
        entries.push(OperationEntry::new(
            S3Operation::ListBuckets,
            Method::GET,
            PathShape::Service,
        ));

        debug!(
            entries = entries.len(),
            domain_suffix = ?domain_suffix,
            "built S3 operation catalog"
        );

        Self {
            entries: entries.into(),
            domain_suffix,
        }
    }

    /// Entries in precedence order.
    #[must_use]
    pub fn entries(&self) -> &[OperationEntry] {
        &self.entries
    }

    /// The virtual-host suffix, if virtual-hosted style is enabled.
    #[must_use]
    pub fn domain_suffix(&self) -> Option<&str> {
        self.domain_suffix.as_deref()
    }

    /// Number of declared operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog declares nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn copy_source() -> ValueCondition {
    ValueCondition::Matches(COPY_SOURCE_PATTERN.clone())
}

/// Operations on `/{bucket}/{key}`.
fn object_entries() -> Vec<OperationEntry> {
    use PathShape::HasObject;
    use S3Operation as Op;
    use ValueCondition::{Digits, Present};

    vec![
        // PUT: copy-part, copy, part, sub-resources, then the plain upload.
        OperationEntry::new(Op::UploadPartCopy, Method::PUT, HasObject)
            .header(x_amz_copy_source(), copy_source())
            .query_var("partNumber", Digits)
            .query_var("uploadId", Present)
            .not_implemented(),
        OperationEntry::new(Op::CopyObject, Method::PUT, HasObject)
            .header(x_amz_copy_source(), copy_source())
            .not_implemented(),
        OperationEntry::new(Op::UploadPart, Method::PUT, HasObject)
            .query_var("partNumber", Digits)
            .query_var("uploadId", Present)
            .not_implemented(),
        OperationEntry::new(Op::PutObjectTagging, Method::PUT, HasObject)
            .query("tagging", Present)
            .not_implemented(),
        OperationEntry::new(Op::PutObjectAcl, Method::PUT, HasObject)
            .query("acl", Present)
            .not_implemented(),
        OperationEntry::new(Op::PutObject, Method::PUT, HasObject),
        // GET
        OperationEntry::new(Op::ListParts, Method::GET, HasObject)
            .query_var("uploadId", Present)
            .not_implemented(),
        OperationEntry::new(Op::GetObjectAcl, Method::GET, HasObject)
            .query("acl", Present)
            .not_implemented(),
        OperationEntry::new(Op::GetObjectTagging, Method::GET, HasObject)
            .query("tagging", Present)
            .not_implemented(),
        OperationEntry::new(Op::GetObject, Method::GET, HasObject),
        // HEAD
        OperationEntry::new(Op::HeadObject, Method::HEAD, HasObject),
        // POST
        OperationEntry::new(Op::CompleteMultipartUpload, Method::POST, HasObject)
            .query_var("uploadId", Present)
            .not_implemented(),
        OperationEntry::new(Op::CreateMultipartUpload, Method::POST, HasObject)
            .query("uploads", Present)
            .not_implemented(),
        // DELETE
        OperationEntry::new(Op::AbortMultipartUpload, Method::DELETE, HasObject)
            .query_var("uploadId", Present)
            .not_implemented(),
        OperationEntry::new(Op::DeleteObjectTagging, Method::DELETE, HasObject)
            .query("tagging", Present)
            .not_implemented(),
        OperationEntry::new(Op::DeleteObject, Method::DELETE, HasObject),
    ]
}

/// Operations on `/{bucket}`.
fn bucket_entries() -> Vec<OperationEntry> {
    use PathShape::BucketRoot;
    use S3Operation as Op;
    use ValueCondition::{Equals, Present};

    let get_sub_resources = vec![
        OperationEntry::new(Op::ListMultipartUploads, Method::GET, BucketRoot)
            .query("uploads", Present)
            .not_implemented(),
        OperationEntry::new(Op::ListObjectsV2, Method::GET, BucketRoot)
            .query("list-type", Equals("2"))
            .not_implemented(),
        OperationEntry::new(Op::GetBucketLocation, Method::GET, BucketRoot)
            .query("location", Present)
            .not_implemented(),
        OperationEntry::new(Op::GetBucketPolicy, Method::GET, BucketRoot)
            .query("policy", Present)
            .not_implemented(),
        OperationEntry::new(Op::GetBucketAcl, Method::GET, BucketRoot)
            .query("acl", Present)
            .not_implemented(),
        OperationEntry::new(Op::GetBucketVersioning, Method::GET, BucketRoot)
            .query("versioning", Present)
            .not_implemented(),
        OperationEntry::new(Op::GetBucketTagging, Method::GET, BucketRoot)
            .query("tagging", Present)
            .not_implemented(),
        OperationEntry::new(Op::ListObjectVersions, Method::GET, BucketRoot)
            .query("versions", Present)
            .not_implemented(),
    ];

    // A plain listing is what remains once no sub-resource marker is present.
    let list_objects_v1 = get_sub_resources
        .iter()
        .flat_map(OperationEntry::query_predicates)
        .filter(|p| matches!(p.condition, Present))
        .fold(
            OperationEntry::new(Op::ListObjectsV1, Method::GET, BucketRoot),
            |entry, p| entry.query(p.key, ValueCondition::Absent),
        );

    let mut entries = get_sub_resources;
    entries.push(list_objects_v1);
    entries.extend([
        // PUT
        OperationEntry::new(Op::PutBucketPolicy, Method::PUT, BucketRoot)
            .query("policy", Present)
            .not_implemented(),
        OperationEntry::new(Op::PutBucketAcl, Method::PUT, BucketRoot)
            .query("acl", Present)
            .not_implemented(),
        OperationEntry::new(Op::PutBucketVersioning, Method::PUT, BucketRoot)
            .query("versioning", Present)
            .not_implemented(),
        OperationEntry::new(Op::PutBucketTagging, Method::PUT, BucketRoot)
            .query("tagging", Present)
            .not_implemented(),
        OperationEntry::new(Op::CreateBucket, Method::PUT, BucketRoot),
        // DELETE
        OperationEntry::new(Op::DeleteBucketPolicy, Method::DELETE, BucketRoot)
            .query("policy", Present)
            .not_implemented(),
        OperationEntry::new(Op::DeleteBucketTagging, Method::DELETE, BucketRoot)
            .query("tagging", Present)
            .not_implemented(),
        OperationEntry::new(Op::DeleteBucket, Method::DELETE, BucketRoot),
        // HEAD
        OperationEntry::new(Op::HeadBucket, Method::HEAD, BucketRoot),
        // POST
        OperationEntry::new(Op::DeleteObjects, Method::POST, BucketRoot)
            .query("delete", Present)
            .not_implemented(),
        OperationEntry::new(Op::PostObject, Method::POST, BucketRoot)
            .header(
                http::header::CONTENT_TYPE,
                ValueCondition::Matches(MULTIPART_FORM_PATTERN.clone()),
            )
            .not_implemented(),
    ]);
    entries
}
