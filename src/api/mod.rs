pub mod http;

pub use http::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::ConfigTree;

/// What the backend returns after accepting a configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    #[serde(default)]
    pub message: Option<String>,
}

/// Remote store holding the bot's configuration.
///
/// Saves replace the whole tree; partial updates are not supported.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_configuration(&self) -> anyhow::Result<ConfigTree>;
    async fn save_configuration(&self, tree: &ConfigTree) -> anyhow::Result<SaveReceipt>;
}
