use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{describe_request_error, RelayError};

pub const DEFAULT_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: Option<String>,
}

/// Client for the imgbb upload API.
pub struct UploadClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl UploadClient {
    pub fn new(client: Client, endpoint: Url, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }

    /// Posts the image as base64 form data and returns the hosted URL.
    pub async fn upload(&self, image: &[u8], api_key: &str) -> Result<String, RelayError> {
        let encoded = BASE64.encode(image);

        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .form(&[("key", api_key), ("image", encoded.as_str())])
            .send()
            .await
            .map_err(|e| RelayError::UploadFailed(describe_request_error(&e)))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| RelayError::UploadFailed(describe_request_error(&e)))?;
        let rejected = || RelayError::UploadFailed(format!("status {}, body {}", status, raw));

        let parsed: UploadResponse = serde_json::from_str(&raw).map_err(|_| rejected())?;
        if !status.is_success() || !parsed.success {
            return Err(rejected());
        }

        let url = parsed.data.and_then(|d| d.url).ok_or_else(rejected)?;
        debug!(%url, "image hosted");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn uploader(server: &MockServer) -> UploadClient {
        UploadClient::new(
            Client::builder().no_proxy().build().unwrap(),
            Url::parse(&format!("{}/1/upload", server.uri())).unwrap(),
            Duration::from_secs(15),
        )
    }

    async fn respond(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/1/upload"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn returns_hosted_url() {
        let server = MockServer::start().await;
        // "hello" in standard base64 is "aGVsbG8=", form-encoded as "aGVsbG8%3D".
        Mock::given(method("POST"))
            .and(path("/1/upload"))
            .and(body_string_contains("key=secret-key"))
            .and(body_string_contains("image=aGVsbG8%3D"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "status": 200,
                "data": { "id": "abc", "url": "https://i.ibb.co/abc.png" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = uploader(&server).upload(b"hello", "secret-key").await.unwrap();
        assert_eq!(url, "https://i.ibb.co/abc.png");
    }

    #[tokio::test]
    async fn success_false_is_rejected_even_with_200() {
        let server = MockServer::start().await;
        respond(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({ "success": false })),
        )
        .await;

        let err = uploader(&server).upload(b"hello", "k").await.unwrap_err();
        assert!(matches!(err, RelayError::UploadFailed(ref msg) if msg.contains("\"success\":false")));
    }

    #[tokio::test]
    async fn error_status_is_rejected() {
        let server = MockServer::start().await;
        respond(
            &server,
            ResponseTemplate::new(400).set_body_json(json!({
                "status_code": 400,
                "error": { "message": "Invalid API v1 key.", "code": 100 },
                "success": false
            })),
        )
        .await;

        let err = uploader(&server).upload(b"hello", "bad").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("400"));
        assert!(message.contains("Invalid API v1 key."));
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let server = MockServer::start().await;
        respond(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

        let err = uploader(&server).upload(b"hello", "k").await.unwrap_err();
        assert!(matches!(err, RelayError::UploadFailed(ref msg) if msg.contains("<html>oops</html>")));
    }

    #[tokio::test]
    async fn missing_url_is_rejected() {
        let server = MockServer::start().await;
        respond(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": {} })),
        )
        .await;

        let err = uploader(&server).upload(b"hello", "k").await.unwrap_err();
        assert!(matches!(err, RelayError::UploadFailed(_)));
    }
}
