use std::sync::RwLock;

use async_trait::async_trait;

use super::CredentialStore;

/// Keeps the token for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryStore {
    token: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a token, as if persisted by an earlier run.
    pub fn with_token(token: impl Into<String>) -> Self {
        MemoryStore {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self) -> Result<Option<String>, String> {
        Ok(self.token.read().expect("memory store lock poisoned").clone())
    }

    async fn set(&self, token: &str) -> Result<(), String> {
        *self.token.write().expect("memory store lock poisoned") = Some(token.to_string());
        Ok(())
    }

    async fn remove(&self) -> Result<(), String> {
        self.token.write().expect("memory store lock poisoned").take();
        Ok(())
    }
}
