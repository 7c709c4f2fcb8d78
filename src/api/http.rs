use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{ConfigStore, SaveReceipt};
use crate::types::ConfigTree;

const CONFIG_ENDPOINT: &str = "/config";
const CONFIG_UPDATE_ENDPOINT: &str = "/config/update";

#[derive(Debug, Clone)]
pub struct HttpConfigStore {
    client: Client,
    base_url: String,
}

impl HttpConfigStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl ConfigStore for HttpConfigStore {
    async fn load_configuration(&self) -> Result<ConfigTree> {
        let url = self.url(CONFIG_ENDPOINT);
        debug!("GET {}", url);

        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let body: serde_json::Value = resp.json().await?;
        if !body.is_object() {
            return Err(anyhow!("expected a JSON object from {}, got {}", url, body));
        }
        Ok(ConfigTree::from_json(body)?)
    }

    async fn save_configuration(&self, tree: &ConfigTree) -> Result<SaveReceipt> {
        let url = self.url(CONFIG_UPDATE_ENDPOINT);
        debug!("POST {} ({} top-level keys)", url, tree.len());
        let body = tree.to_json().context("encoding configuration")?;

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        // The backend may answer with an empty or non-JSON body on success.
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building_strips_trailing_slash() {
        let store = HttpConfigStore::new("http://localhost:8000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(store.base_url(), "http://localhost:8000/api");
        assert_eq!(store.url(CONFIG_ENDPOINT), "http://localhost:8000/api/config");
        assert_eq!(store.url(CONFIG_UPDATE_ENDPOINT), "http://localhost:8000/api/config/update");
    }

    #[test]
    fn test_receipt_parsing() {
        let receipt: SaveReceipt = serde_json::from_str(r#"{"message":"ok","status":"saved"}"#).unwrap();
        assert_eq!(receipt.message.as_deref(), Some("ok"));

        let receipt: SaveReceipt = serde_json::from_str("{}").unwrap();
        assert!(receipt.message.is_none());

        let fallback: SaveReceipt = serde_json::from_str("not json").unwrap_or_default();
        assert!(fallback.message.is_none());
    }
}
