use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER, USER_AGENT},
    Client, StatusCode,
};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{describe_request_error, RelayError};
use crate::format::{content_type, is_supported_format};

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36 Edg/135.0.0.0";

const SEARCH_PATH: &str = "/images/search";

// Image results are anchors of class `iusc` carrying JSON metadata in `m`.
static RESULT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a.iusc").unwrap());

// ── Candidate types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ResultMetadata {
    murl: Option<String>,
}

/// Why a single candidate was passed over. Never escapes the scanner.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CandidateError {
    #[error("result has no metadata attribute")]
    MissingMetadata,
    #[error("malformed result metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("result metadata has no media URL")]
    MissingMediaUrl,
    #[error("probe failed: {0}")]
    Probe(String),
    #[error("probe returned {0}")]
    Status(StatusCode),
    #[error("unsupported content type {0:?}")]
    Unsupported(String),
}

// ── Scanner ──────────────────────────────────────────────────────────────────

pub struct ScannerConfig {
    pub base_url: Url,
    pub scan_limit: usize,
    pub user_agent: String,
    pub cookie: Option<String>,
    pub search_timeout: Duration,
    pub probe_timeout: Duration,
}

pub struct ResultScanner {
    client: Client,
    search_url: Url,
    headers: HeaderMap,
    scan_limit: usize,
    search_timeout: Duration,
    probe_timeout: Duration,
}

impl ResultScanner {
    pub fn new(client: Client, config: ScannerConfig) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(REFERER, HeaderValue::from_str(config.base_url.as_str())?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Some(cookie) = config.cookie.as_deref().filter(|c| !c.is_empty()) {
            headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
        }

        let mut search_url = config.base_url;
        search_url.set_path(SEARCH_PATH);

        Ok(Self {
            client,
            search_url,
            headers,
            scan_limit: config.scan_limit,
            search_timeout: config.search_timeout,
            probe_timeout: config.probe_timeout,
        })
    }

    /// Returns the first result, in page order, whose probe answers 2xx with a
    /// supported content type. At most `scan_limit` results are probed.
    pub async fn find_image(&self, query: &str) -> Result<String, RelayError> {
        let html = self.fetch_results_page(query).await?;
        let candidates = extract_candidates(&html, self.scan_limit);
        info!(query, candidates = candidates.len(), "scanning image results");

        for (position, candidate) in candidates.into_iter().enumerate() {
            match self.accept(candidate).await {
                Ok(url) => {
                    info!(query, position, %url, "accepted image result");
                    return Ok(url);
                }
                Err(reason) => {
                    debug!(query, position, %reason, "skipping image result");
                }
            }
        }

        Err(RelayError::NoMatchingImage)
    }

    async fn fetch_results_page(&self, query: &str) -> Result<String, RelayError> {
        let mut url = self.search_url.clone();
        url.query_pairs_mut().append_pair("q", query);

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .timeout(self.search_timeout)
            .send()
            .await
            .map_err(|e| RelayError::SearchFailed(describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::SearchFailed(format!("search provider returned {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| RelayError::SearchFailed(describe_request_error(&e)))
    }

    async fn accept(&self, candidate: Result<String, CandidateError>) -> Result<String, CandidateError> {
        let url = candidate?;
        self.probe(&url).await?;
        Ok(url)
    }

    async fn probe(&self, url: &str) -> Result<(), CandidateError> {
        let response = self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| CandidateError::Probe(describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CandidateError::Status(status));
        }

        let content_type = content_type(response.headers());
        if !is_supported_format(content_type) {
            return Err(CandidateError::Unsupported(content_type.to_string()));
        }
        Ok(())
    }
}

// ── HTML parsing ─────────────────────────────────────────────────────────────

/// Media URLs of the first `limit` image results. The prefix is taken before
/// decoding, so results with unusable metadata still count against the limit.
pub(crate) fn extract_candidates(html: &str, limit: usize) -> Vec<Result<String, CandidateError>> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_SELECTOR)
        .take(limit)
        .map(|el| -> Result<String, CandidateError> {
            let raw = el.value().attr("m").ok_or(CandidateError::MissingMetadata)?;
            let metadata: ResultMetadata = serde_json::from_str(raw)?;
            metadata
                .murl
                .filter(|u| !u.trim().is_empty())
                .ok_or(CandidateError::MissingMediaUrl)
        })
        .collect()
}
