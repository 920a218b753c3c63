use super::CredentialStore;
use async_trait::async_trait;

/// A no-op store that always returns an error if called,
/// indicating persistence is disabled.
pub struct NoStore;

impl NoStore {
    pub fn new() -> Self {
        NoStore
    }
}

impl Default for NoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for NoStore {
    async fn get(&self) -> Result<Option<String>, String> {
        Err("Credential store is disabled".into())
    }

    async fn set(&self, _token: &str) -> Result<(), String> {
        Err("Credential store is disabled".into())
    }

    async fn remove(&self) -> Result<(), String> {
        Err("Credential store is disabled".into())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
