use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::{describe_request_error, RelayError};
use crate::format::{content_type, is_supported_format};

pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Downloads an image the scanner accepted. Status and content type are
/// checked again here; the probe only narrowed the candidates.
pub struct ImageFetcher {
    client: Client,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn fetch(&self, url: &str) -> Result<ImagePayload, RelayError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::DownloadFailed(describe_request_error(&e)))?;

        let status = response.status();
        let content_type = content_type(response.headers()).to_string();

        // Headers are judged before the body is pulled off the wire.
        if !status.is_success() || !content_type.starts_with("image") {
            return Err(RelayError::DownloadFailed(format!(
                "status {}, content type {:?}",
                status, content_type
            )));
        }
        if !is_supported_format(&content_type) {
            return Err(RelayError::UnsupportedFormat(content_type));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::DownloadFailed(describe_request_error(&e)))?;
        debug!(%url, size = bytes.len(), %content_type, "downloaded image");

        Ok(ImagePayload {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
