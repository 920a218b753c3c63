use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::cookie_file_store::CookieFileConfig;

/// Where the session token is persisted between reloads:
/// - enabled: if false, nothing is persisted (NoStore).
/// - backend: the persistence backend.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct StoreConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: Option<StoreBackend>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            enabled: true,
            backend: Some(StoreBackend::Memory),
        }
    }
}

/// Store backends, selected by a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum StoreBackend {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "cookie-file")]
    CookieFile(CookieFileConfig),
}
