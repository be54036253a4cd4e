//! Backend that describes where a classified request lands on the filer.
//!
//! Storage lives behind the filer, which this gateway does not talk to. The
//! backend answers every served operation with a JSON description of the
//! classification and the filer path it maps to, so clients and operators can
//! see the routing decision end to end.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use s3gate_http::body::GatewayBody;
use s3gate_http::config::GatewayConfig;
use s3gate_http::dispatch::{OperationParams, S3Backend};
use s3gate_model::S3Operation;
use s3gate_model::error::S3Error;
use serde::Serialize;

/// Header naming the operation a request was classified as.
pub const OPERATION_HEADER: &str = "x-s3gate-operation";

/// JSON document returned for each served request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationDescription<'a> {
    operation: &'static str,
    bucket: &'a str,
    key: &'a str,
    query: Vec<(&'a str, &'a str)>,
    vars: BTreeMap<&'static str, &'a str>,
    filer: &'a str,
    filer_path: String,
    content_length: usize,
}

/// Describes the classification of every backend-bound request.
#[derive(Debug, Clone)]
pub struct DescribeBackend {
    buckets_path: String,
    filer: String,
}

impl DescribeBackend {
    /// Build from the gateway configuration.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            buckets_path: config.buckets_path.trim_end_matches('/').to_owned(),
            filer: config.filer.clone(),
        }
    }

    /// The filer path `bucket`/`key` are stored under.
    fn filer_path(&self, bucket: &str, key: &str) -> String {
        match (bucket.is_empty(), key.is_empty()) {
            (true, _) => format!("{}/", self.buckets_path),
            (false, true) => format!("{}/{bucket}", self.buckets_path),
            (false, false) => format!("{}/{bucket}/{key}", self.buckets_path),
        }
    }

    fn describe(
        &self,
        op: S3Operation,
        params: &OperationParams,
        body: &Bytes,
    ) -> Result<http::Response<GatewayBody>, S3Error> {
        let description = OperationDescription {
            operation: op.as_str(),
            bucket: &params.bucket,
            key: &params.key,
            query: params
                .query
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            vars: params.vars.iter().map(|(k, v)| (*k, v.as_str())).collect(),
            filer: &self.filer,
            filer_path: self.filer_path(&params.bucket, &params.key),
            content_length: body.len(),
        };

        let json = serde_json::to_vec(&description).map_err(|e| {
            S3Error::internal_error("failed to encode operation description").with_source(e)
        })?;

        let body = if matches!(op, S3Operation::HeadObject | S3Operation::HeadBucket) {
            GatewayBody::empty()
        } else {
            GatewayBody::from(json)
        };

        http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(OPERATION_HEADER, op.as_str())
            .body(body)
            .map_err(|e| S3Error::internal_error("failed to build response").with_source(e))
    }
}

impl S3Backend for DescribeBackend {
    fn handle_operation(
        &self,
        op: S3Operation,
        params: OperationParams,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<GatewayBody>, S3Error>> + Send>> {
        let result = self.describe(op, &params, &body);
        Box::pin(async move { result })
    }
}
