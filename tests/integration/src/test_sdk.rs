//! Behaviour as seen through the AWS SDK.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ProvideErrorMetadata;
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_accept_sdk_put_object() {
        let client = s3_client();
        let bucket = test_bucket_name("sdkput");

        client
            .put_object()
            .bucket(&bucket)
            .key("file.txt")
            .body(ByteStream::from_static(b"data"))
            .send()
            .await
            .expect("put should be routed to the backend");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_stubbed_operation_with_not_implemented() {
        let client = s3_client();
        let bucket = test_bucket_name("policy");

        let err = client
            .get_bucket_policy()
            .bucket(&bucket)
            .send()
            .await
            .expect_err("GetBucketPolicy is not implemented");
        assert_eq!(err.into_service_error().code(), Some("NotImplemented"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_multipart_upload_with_not_implemented() {
        let client = s3_client();
        let bucket = test_bucket_name("mpu");

        let err = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("big.bin")
            .send()
            .await
            .expect_err("CreateMultipartUpload is not implemented");
        assert_eq!(err.into_service_error().code(), Some("NotImplemented"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_route_head_bucket() {
        let client = s3_client();
        let bucket = test_bucket_name("head");

        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("head bucket should be routed to the backend");
    }
}
