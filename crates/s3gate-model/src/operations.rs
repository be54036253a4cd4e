//! The S3 operations the gateway knows how to recognise.

use std::fmt;

/// Declares [`S3Operation`] together with its name table, so the variant list
/// and the wire names cannot drift apart.
macro_rules! declare_operations {
    ($($(#[$doc:meta])* $variant:ident,)*) => {
        /// A named S3 request/response contract.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum S3Operation {
            $($(#[$doc])* $variant,)*
        }

        impl S3Operation {
            /// Every operation, in declaration order.
            pub const ALL: &'static [S3Operation] = &[$(S3Operation::$variant,)*];

            /// Returns the operation name as used in logs and error resources.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }
        }
    };
}

declare_operations! {
    // Service level.
    /// `GET /`
    ListBuckets,

    // Bucket level.
    /// `PUT /{bucket}`
    CreateBucket,
    /// `DELETE /{bucket}`
    DeleteBucket,
    /// `HEAD /{bucket}`
    HeadBucket,
    /// `GET /{bucket}` without a recognised sub-resource.
    ListObjectsV1,
    /// `GET /{bucket}?list-type=2`
    ListObjectsV2,
    /// `GET /{bucket}?versions`
    ListObjectVersions,
    /// `GET /{bucket}?uploads`
    ListMultipartUploads,
    /// `GET /{bucket}?location`
    GetBucketLocation,
    /// `GET /{bucket}?policy`
    GetBucketPolicy,
    /// `PUT /{bucket}?policy`
    PutBucketPolicy,
    /// `DELETE /{bucket}?policy`
    DeleteBucketPolicy,
    /// `GET /{bucket}?acl`
    GetBucketAcl,
    /// `PUT /{bucket}?acl`
    PutBucketAcl,
    /// `GET /{bucket}?versioning`
    GetBucketVersioning,
    /// `PUT /{bucket}?versioning`
    PutBucketVersioning,
    /// `GET /{bucket}?tagging`
    GetBucketTagging,
    /// `PUT /{bucket}?tagging`
    PutBucketTagging,
    /// `DELETE /{bucket}?tagging`
    DeleteBucketTagging,
    /// `POST /{bucket}?delete`
    DeleteObjects,
    /// Browser-based upload: `POST /{bucket}` with a multipart form body.
    PostObject,

    // Object level.
    /// `PUT /{bucket}/{key}`
    PutObject,
    /// `PUT /{bucket}/{key}` with `x-amz-copy-source`.
    CopyObject,
    /// `GET /{bucket}/{key}`
    GetObject,
    /// `HEAD /{bucket}/{key}`
    HeadObject,
    /// `DELETE /{bucket}/{key}`
    DeleteObject,
    /// `GET /{bucket}/{key}?acl`
    GetObjectAcl,
    /// `PUT /{bucket}/{key}?acl`
    PutObjectAcl,
    /// `GET /{bucket}/{key}?tagging`
    GetObjectTagging,
    /// `PUT /{bucket}/{key}?tagging`
    PutObjectTagging,
    /// `DELETE /{bucket}/{key}?tagging`
    DeleteObjectTagging,

    // Multipart uploads.
    /// `POST /{bucket}/{key}?uploads`
    CreateMultipartUpload,
    /// `PUT /{bucket}/{key}?partNumber=N&uploadId=U`
    UploadPart,
    /// `UploadPart` with `x-amz-copy-source`.
    UploadPartCopy,
    /// `POST /{bucket}/{key}?uploadId=U`
    CompleteMultipartUpload,
    /// `DELETE /{bucket}/{key}?uploadId=U`
    AbortMultipartUpload,
    /// `GET /{bucket}/{key}?uploadId=U`
    ListParts,
}

impl fmt::Display for S3Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
