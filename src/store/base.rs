use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{cookie_file_store::CookieFileStore, memory_store::MemoryStore, no_store::NoStore};
use crate::config::{StoreBackend, StoreConfig};

/// Durable home of the session token, so it survives a reload.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> Result<Option<String>, String>;
    async fn set(&self, token: &str) -> Result<(), String>;
    async fn remove(&self) -> Result<(), String>;
    fn is_enabled(&self) -> bool {
        // Real stores are always enabled; NoStore says otherwise so logs can tell.
        true
    }
}

/// Creates a concrete store implementation based on the StoreConfig.
/// If `store.enabled = false`, returns NoStore. Otherwise, picks the specified backend.
pub fn create_store(config: &StoreConfig) -> Arc<dyn CredentialStore> {
    if !config.enabled {
        info!("Credential store is disabled. Using NoStore.");
        return Arc::new(NoStore::new());
    }

    match &config.backend {
        Some(StoreBackend::CookieFile(cookie_config)) => {
            info!(
                "Persisting credentials to cookie jar '{}'",
                cookie_config.path
            );
            Arc::new(CookieFileStore::new(cookie_config))
        }
        Some(StoreBackend::Memory) => {
            info!("Keeping credentials in memory only.");
            Arc::new(MemoryStore::new())
        }
        None => {
            warn!("Store is enabled, but no backend config is provided; using memory.");
            Arc::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_store_picks_backend() {
        let disabled = create_store(&StoreConfig {
            enabled: false,
            backend: Some(StoreBackend::Memory),
        });
        assert!(!disabled.is_enabled());

        let fallback = create_store(&StoreConfig {
            enabled: true,
            backend: None,
        });
        assert!(fallback.is_enabled());
        fallback.set("t").await.unwrap();
        assert_eq!(fallback.get().await.unwrap().as_deref(), Some("t"));
    }
}
