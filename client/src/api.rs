use anyhow::{Context, Result};
use url::Url;

pub const BASE_URL_ENV: &str = "VIDSEND_API_URL";
const DEFAULT_BASE_URL: &str = "http://localhost:3001";
const UPLOAD_PATH: &str = "/api/upload";

/// Resolves the upload endpoint for the current environment. Precedence:
/// explicit CLI value, then `VIDSEND_API_URL`, then the local dev backend.
pub struct ApiConfig {
    base_url: Url,
}

impl ApiConfig {
    pub fn resolve(cli_base_url: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_base_url, std::env::var(BASE_URL_ENV).ok())
    }

    fn resolve_with(cli_base_url: Option<&str>, env_base_url: Option<String>) -> Result<Self> {
        let raw = match cli_base_url {
            Some(value) => value.to_string(),
            None => env_base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = Url::parse(&raw).with_context(|| format!("invalid base URL: {raw}"))?;
        Ok(Self { base_url })
    }

    pub fn upload_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(UPLOAD_PATH);
        url
    }
}
