//! Raw HTTP classification tests.

#[cfg(test)]
mod tests {
    use crate::{domain_name, endpoint_url, http_client, test_bucket_name};

    const OPERATION_HEADER: &str = "x-s3gate-operation";

    fn operation(resp: &reqwest::Response) -> Option<String> {
        resp.headers()
            .get(OPERATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_health_check() {
        let resp = http_client()
            .get(format!("{}/_health", endpoint_url()))
            .send()
            .await
            .expect("server reachable");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_describe_path_style_put() {
        let bucket = test_bucket_name("put");
        let resp = http_client()
            .put(format!("{}/{bucket}/dir/file.txt", endpoint_url()))
            .body("hello")
            .send()
            .await
            .expect("server reachable");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(operation(&resp).as_deref(), Some("PutObject"));

        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["bucket"], bucket.as_str());
        assert_eq!(json["key"], "dir/file.txt");
        assert_eq!(json["contentLength"], 5);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_tell_list_versions_apart() {
        let client = http_client();
        let bucket = test_bucket_name("list");
        let base = format!("{}/{bucket}", endpoint_url());

        let v1 = client.get(&base).send().await.expect("server reachable");
        assert_eq!(operation(&v1).as_deref(), Some("ListObjectsV1"));

        let v2 = client
            .get(format!("{base}?list-type=2"))
            .send()
            .await
            .expect("server reachable");
        assert_eq!(v2.status(), reqwest::StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_resolve_virtual_hosted_bucket() {
        let resp = http_client()
            .get(format!("{}/photos", endpoint_url()))
            .header("Host", format!("photos.{}", domain_name()))
            .send()
            .await
            .expect("server reachable");
        assert_eq!(operation(&resp).as_deref(), Some("ListObjectsV1"));

        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["bucket"], "photos");
        assert_eq!(json["key"], "");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_request_shape() {
        let resp = http_client()
            .patch(format!("{}/some-bucket", endpoint_url()))
            .send()
            .await
            .expect("server reachable");
        assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
        let text = resp.text().await.expect("text body");
        assert!(text.contains("<Code>MethodNotAllowed</Code>"));
    }
}
