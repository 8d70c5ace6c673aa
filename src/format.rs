use reqwest::header::{HeaderMap, CONTENT_TYPE};

/// Substrings a content type must contain for the image to be relayed.
const SUPPORTED_FORMATS: &[&str] = &["jpeg", "jpg", "png"];

/// Plain substring match, no MIME parsing: `image/png; charset=binary` passes,
/// `IMAGE/PNG` does not.
pub fn is_supported_format(content_type: &str) -> bool {
    SUPPORTED_FORMATS
        .iter()
        .any(|format| content_type.contains(format))
}

/// Raw `Content-Type` header value, or `""` when absent or not valid ASCII.
pub fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_jpeg_jpg_and_png() {
        assert!(is_supported_format("image/png"));
        assert!(is_supported_format("image/jpeg"));
        assert!(is_supported_format("image/jpg"));
        assert!(is_supported_format("image/pjpeg"));
        assert!(is_supported_format("image/png; charset=binary"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_supported_format("image/gif"));
        assert!(!is_supported_format("image/webp"));
        assert!(!is_supported_format("application/json"));
        assert!(!is_supported_format(""));
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(!is_supported_format("IMAGE/PNG"));
        assert!(!is_supported_format("image/JPEG"));
    }

    #[test]
    fn reads_content_type_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_type(&headers), "");

        headers.insert(CONTENT_TYPE, "image/png".parse().unwrap());
        assert_eq!(content_type(&headers), "image/png");
    }
}
