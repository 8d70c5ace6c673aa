use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct GetImageParams {
    #[serde(default)]
    pub product: String,
    pub imgbb_key: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ImageUrlResponse {
    pub status: Status,
    pub product: String,
    pub url: String,
    pub markdown_embed: String,
}

impl ImageUrlResponse {
    pub fn new(product: String, url: String) -> Self {
        let markdown_embed = format!("![{}]({})", product, url);
        Self {
            status: Status::Success,
            product,
            url,
            markdown_embed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: Status,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            status: Status::Error,
            message,
        }
    }
}
