use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Base URL of the record store API, without a trailing slash.
    pub base_url: String,
    /// Optional bearer token attached to every request.
    pub token: Option<String>,
}

impl StoreConfig {
    pub fn load() -> Result<Self> {
        let base_url =
            std::env::var("RECORD_STORE_URL").context("RECORD_STORE_URL missing")?;
        let token = std::env::var("RECORD_STORE_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Ok(Self::new(base_url, token))
    }

    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, token }
    }
}
