use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::IdentityService;
use crate::models::{Credentials, Profile};

fn default_token() -> String {
    "mock-token-admin-123456".to_string()
}

fn default_username() -> String {
    "Admin".to_string()
}

fn default_roles() -> Vec<String> {
    vec!["admin".to_string()]
}

fn default_login_latency_ms() -> u64 {
    500
}

fn default_profile_latency_ms() -> u64 {
    200
}

/// Canned identity: every login succeeds with the same token and every token
/// maps to the same profile, after a fixed delay.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct MockIdentityConfig {
    pub name: String,
    #[serde(default = "default_token")]
    pub token: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    #[serde(default = "default_login_latency_ms")]
    pub login_latency_ms: u64,
    #[serde(default = "default_profile_latency_ms")]
    pub profile_latency_ms: u64,
}

pub struct MockIdentityService {
    pub config: MockIdentityConfig,
}

impl MockIdentityService {
    pub fn new(config: &MockIdentityConfig) -> Self {
        info!(
            "Creating mock identity service '{}' for user '{}'",
            config.name, config.username
        );
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    fn get_name(&self) -> &str {
        &self.config.name
    }

    fn get_type(&self) -> &str {
        "mock"
    }

    /// Accepts any credentials.
    async fn login(&self, credentials: &Credentials) -> Result<String, String> {
        tokio::time::sleep(Duration::from_millis(self.config.login_latency_ms)).await;
        debug!(
            "Mock login for '{}' accepted without verification",
            credentials.username
        );
        Ok(self.config.token.clone())
    }

    async fn fetch_profile(&self, token: &str) -> Result<Profile, String> {
        tokio::time::sleep(Duration::from_millis(self.config.profile_latency_ms)).await;
        if token.is_empty() {
            return Err("Empty token".to_string());
        }
        Ok(Profile::new(
            self.config.username.clone(),
            self.config.roles.clone(),
        ))
    }
}
