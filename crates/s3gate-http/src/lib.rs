//! Request dispatch for an S3-compatible gateway.
//!
//! Given an incoming HTTP request, this crate decides which S3 operation it
//! represents and extracts the operation's parameters. S3 overloads a single
//! method and path across many operations, told apart only by query keys and
//! headers, so the decision is made against an ordered catalog of predicate
//! records rather than a conventional router.
//!
//! - **Addressing** ([`addressing`]): virtual-hosted-style and path-style
//!   bucket resolution.
//! - **Catalog** ([`catalog`]): every recognised operation, in precedence order.
//! - **Matcher** ([`matcher`]): evaluates one catalog entry against one request.
//! - **Dispatch** ([`dispatch`]): first-match classification and the
//!   [`S3Backend`](dispatch::S3Backend) boundary.
//! - **Response** ([`response`]): S3 `<Error>` documents.
//! - **Service** ([`service`]): the hyper [`GatewayService`](service::GatewayService).
//! - **Config** ([`config`]): [`GatewayConfig`](config::GatewayConfig) from the
//!   environment.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> GatewayService (hyper Service)
//!     -> Health check interception
//!     -> classify: resolve address, first matching catalog entry
//!     -> Body collection (backend-bound operations only)
//!     -> dispatch_operation (S3Backend trait, or NotImplemented stub)
//!     -> Common response headers
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use s3gate_http::catalog::OperationCatalog;
//! use s3gate_http::dispatch::NotImplementedBackend;
//! use s3gate_http::service::GatewayService;
//!
//! let catalog = OperationCatalog::build(Some("s3.example.com"));
//! let service = GatewayService::new(NotImplementedBackend, catalog);
//! // Use `service` with a hyper server.
//! ```

// S3Error is the error type backends return; boxing it in every Result buys
// nothing on this path.
#![allow(clippy::result_large_err)]

pub mod addressing;
pub mod body;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod matcher;
pub mod request;
pub mod response;
pub mod service;

pub use addressing::{AddressingStyle, BucketAddress};
pub use body::GatewayBody;
pub use catalog::{Binding, OperationCatalog, OperationEntry};
pub use config::GatewayConfig;
pub use dispatch::{DispatchError, MatchResult, NotImplementedBackend, OperationParams, S3Backend};
pub use request::S3RequestView;
pub use service::GatewayService;
