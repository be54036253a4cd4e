//! Predicate evaluation for a single catalog entry.

use crate::addressing::BucketAddress;
use crate::catalog::{OperationEntry, PathShape};
use crate::request::S3RequestView;

/// Whether every predicate of `entry` holds for the request.
///
/// Checks run cheapest first (method, path shape, headers, query) and stop at
/// the first failure.
#[must_use]
pub fn matches(entry: &OperationEntry, request: &S3RequestView<'_>, address: &BucketAddress) -> bool {
    entry.method() == request.method()
        && shape_matches(entry.path_shape(), address)
        && entry
            .header_predicates()
            .iter()
            .all(|p| p.condition.holds(request.header_value(&p.name)))
        && entry
            .query_predicates()
            .iter()
            .all(|p| p.condition.holds(request.query_value(p.key)))
}

fn shape_matches(shape: PathShape, address: &BucketAddress) -> bool {
    match shape {
        PathShape::Service => address.is_service(),
        PathShape::BucketRoot => !address.bucket().is_empty() && address.key().is_empty(),
        PathShape::HasObject => !address.bucket().is_empty() && !address.key().is_empty(),
    }
}
