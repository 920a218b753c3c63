use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::CredentialStore;

fn default_cookie_name() -> String {
    "ophthadesk-token".to_string()
}

/// Where the cookie jar lives and which cookie holds the token.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct CookieFileConfig {
    pub path: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

/// Persists the token as one cookie in a JSON cookie jar on disk. Other
/// cookies in the jar are left untouched.
pub struct CookieFileStore {
    path: PathBuf,
    cookie_name: String,
}

type CookieJar = BTreeMap<String, String>;

impl CookieFileStore {
    pub fn new(config: &CookieFileConfig) -> Self {
        CookieFileStore {
            path: PathBuf::from(&config.path),
            cookie_name: config.cookie_name.clone(),
        }
    }

    async fn read_raw(&self) -> Result<Vec<u8>, String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(format!(
                "Failed to read cookie jar '{}': {}",
                self.path.display(),
                e
            )),
        }
    }

    fn parse_jar(bytes: &[u8]) -> Result<CookieJar, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(CookieJar::new());
        }
        serde_json::from_slice(bytes)
    }

    async fn read_jar(&self) -> Result<CookieJar, String> {
        let bytes = self.read_raw().await?;
        Self::parse_jar(&bytes)
            .map_err(|e| format!("Cookie jar '{}' is corrupt: {}", self.path.display(), e))
    }

    /// Writes to a sibling file first so a crash never leaves a half-written jar.
    async fn write_jar(&self, jar: &CookieJar) -> Result<(), String> {
        let bytes = serde_json::to_vec_pretty(jar).map_err(|e| e.to_string())?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| format!("Failed to write '{}': {}", tmp.display(), e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| format!("Failed to replace '{}': {}", self.path.display(), e))
    }
}

#[async_trait]
impl CredentialStore for CookieFileStore {
    async fn get(&self) -> Result<Option<String>, String> {
        let jar = self.read_jar().await?;
        Ok(jar
            .get(&self.cookie_name)
            .filter(|v| !v.is_empty())
            .cloned())
    }

    async fn set(&self, token: &str) -> Result<(), String> {
        let bytes = self.read_raw().await?;
        let mut jar = match Self::parse_jar(&bytes) {
            Ok(jar) => jar,
            Err(e) => {
                warn!(
                    "Cookie jar '{}' is corrupt ({}); starting a fresh one",
                    self.path.display(),
                    e
                );
                CookieJar::new()
            }
        };
        jar.insert(self.cookie_name.clone(), token.to_string());
        self.write_jar(&jar).await?;
        debug!("Stored cookie '{}'", self.cookie_name);
        Ok(())
    }

    async fn remove(&self) -> Result<(), String> {
        let mut jar = self.read_jar().await?;
        if jar.remove(&self.cookie_name).is_none() {
            return Ok(());
        }
        self.write_jar(&jar).await?;
        debug!("Removed cookie '{}'", self.cookie_name);
        Ok(())
    }
}
