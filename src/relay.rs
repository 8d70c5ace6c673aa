use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tracing::info;
use url::Url;

use crate::error::RelayError;
use crate::fetch::ImageFetcher;
use crate::scan::{ResultScanner, ScannerConfig};
use crate::settings::Settings;
use crate::upload::UploadClient;

const CLIENT_USER_AGENT: &str = "image-relay-api/0.1";

/// Search → download → upload. Holds no per-request state; one instance
/// serves every request.
pub struct ImageRelay {
    scanner: ResultScanner,
    fetcher: ImageFetcher,
    uploader: UploadClient,
    default_api_key: Option<String>,
}

impl ImageRelay {
    pub fn new(
        scanner: ResultScanner,
        fetcher: ImageFetcher,
        uploader: UploadClient,
        default_api_key: Option<String>,
    ) -> Self {
        Self {
            scanner,
            fetcher,
            uploader,
            default_api_key,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = http_client(settings.insecure_ssl)?;

        let base_url = Url::parse(&settings.search_base_url)
            .with_context(|| format!("invalid search_base_url {:?}", settings.search_base_url))?;
        let scanner = ResultScanner::new(
            client.clone(),
            ScannerConfig {
                base_url,
                scan_limit: settings.scan_limit,
                user_agent: settings.user_agent.clone(),
                cookie: settings.search_cookie.clone(),
                search_timeout: Duration::from_secs(settings.search_timeout_secs),
                probe_timeout: Duration::from_secs(settings.probe_timeout_secs),
            },
        )
        .context("search headers contain an invalid value")?;

        let fetcher = ImageFetcher::new(
            client.clone(),
            Duration::from_secs(settings.download_timeout_secs),
        );

        let upload_url = Url::parse(&settings.upload_url)
            .with_context(|| format!("invalid upload_url {:?}", settings.upload_url))?;
        let uploader = UploadClient::new(
            client,
            upload_url,
            Duration::from_secs(settings.upload_timeout_secs),
        );

        Ok(Self::new(
            scanner,
            fetcher,
            uploader,
            settings.imgbb_api_key.clone(),
        ))
    }

    /// Runs the whole chain for one keyword and returns the hosted URL. The
    /// first failing stage ends the request.
    pub async fn relay(&self, product: &str, api_key: Option<&str>) -> Result<String, RelayError> {
        let product = product.trim();
        if product.is_empty() {
            return Err(RelayError::EmptyQuery);
        }

        let image_url = self.scanner.find_image(product).await?;
        let image = self.fetcher.fetch(&image_url).await?;

        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or(self.default_api_key.as_deref())
            .ok_or(RelayError::MissingCredential)?;

        info!(
            product,
            %image_url,
            size = image.bytes.len(),
            content_type = %image.content_type,
            "uploading image"
        );
        self.uploader.upload(&image.bytes, api_key).await
    }
}

/// One pooled client shared by every stage. Per-stage timeouts are set on
/// each request.
pub fn http_client(insecure: bool) -> anyhow::Result<Client> {
    let mut builder = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(CLIENT_USER_AGENT);

    if insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().context("failed to build HTTP client")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A relay whose search and upload endpoints live on `base`.
    pub fn relay_against(base: &str, default_api_key: Option<&str>) -> ImageRelay {
        let client = Client::builder().no_proxy().build().unwrap();
        let scanner = ResultScanner::new(
            client.clone(),
            ScannerConfig {
                base_url: Url::parse(base).unwrap(),
                scan_limit: 5,
                user_agent: "image-relay-test/1.0".to_string(),
                cookie: None,
                search_timeout: Duration::from_secs(10),
                probe_timeout: Duration::from_secs(5),
            },
        )
        .unwrap();
        ImageRelay::new(
            scanner,
            ImageFetcher::new(client.clone(), Duration::from_secs(10)),
            UploadClient::new(
                client,
                Url::parse(&format!("{base}/1/upload")).unwrap(),
                Duration::from_secs(15),
            ),
            default_api_key.map(str::to_string),
        )
    }
}
