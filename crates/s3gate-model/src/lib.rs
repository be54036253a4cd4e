//! Shared vocabulary of the s3gate dispatcher: the S3 operations it can
//! recognise and the protocol errors it reports.

pub mod error;
pub mod operations;

pub use error::{S3Error, S3ErrorCode};
pub use operations::S3Operation;
