// ── Error type ───────────────────────────────────────────────────────────────

/// Failures that end a relay request. Every variant surfaces to the caller as
/// the same `500` envelope; only the message differs.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Search keyword must not be empty")]
    EmptyQuery,
    #[error("Image search request failed: {0}")]
    SearchFailed(String),
    #[error("No image URL with a supported format found (jpg/jpeg/png only)")]
    NoMatchingImage,
    #[error("Image download failed or content is not an image: {0}")]
    DownloadFailed(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Upload failed, check the response: {0}")]
    UploadFailed(String),
    #[error("No imgbb API key supplied and no default key is configured")]
    MissingCredential,
}

/// Prefix a transport error with its kind so the message says whether the
/// upstream was slow, unreachable, or something else.
pub fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("TimeoutError: {}", e)
    } else if e.is_connect() {
        format!("ConnectError: {}", e)
    } else {
        format!("RequestError: {}", e)
    }
}
