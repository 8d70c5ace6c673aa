use std::{net::IpAddr, path::PathBuf};

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

use crate::scan::DEFAULT_USER_AGENT;
use crate::upload::DEFAULT_UPLOAD_URL;

const ENV_PREFIX: &str = "IMAGE_RELAY";

/// Fallback variable for the imgbb key, checked after `IMAGE_RELAY_IMGBB_API_KEY`.
const IMGBB_KEY_VAR: &str = "IMGBB_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    /// Server URL advertised in the OpenAPI document.
    pub public_url: String,
    pub allow_cors: bool,
    pub static_dir: PathBuf,
    pub insecure_ssl: bool,

    pub imgbb_api_key: Option<String>,
    pub upload_url: String,
    pub upload_timeout_secs: u64,

    pub search_base_url: String,
    /// Session cookie sent to the search provider. Optional and expiring.
    pub search_cookie: Option<String>,
    pub user_agent: String,
    pub scan_limit: usize,
    pub search_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Settings {
    /// Defaults overridden by `IMAGE_RELAY_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Self::from_env(Environment::with_prefix(ENV_PREFIX))?;
        if settings.imgbb_api_key.is_none() {
            settings.imgbb_api_key = std::env::var(IMGBB_KEY_VAR).ok().filter(|k| !k.is_empty());
        }
        Ok(settings)
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = defaults()?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.scan_limit == 0 {
            return Err(ConfigError::Message("scan_limit must be at least 1".to_string()));
        }
        Ok(Settings {
            imgbb_api_key: settings.imgbb_api_key.filter(|k| !k.is_empty()),
            ..settings
        })
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8000)?
        .set_default("public_url", "http://localhost:8000")?
        .set_default("allow_cors", true)?
        .set_default("static_dir", "static")?
        .set_default("insecure_ssl", false)?
        .set_default("upload_url", DEFAULT_UPLOAD_URL)?
        .set_default("upload_timeout_secs", 15)?
        .set_default("search_base_url", "https://www.bing.com")?
        .set_default("user_agent", DEFAULT_USER_AGENT)?
        .set_default("scan_limit", 5)?
        .set_default("search_timeout_secs", 10)?
        .set_default("probe_timeout_secs", 5)?
        .set_default("download_timeout_secs", 10)
}
