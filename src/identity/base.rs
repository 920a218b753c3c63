use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    mock_identity::{MockIdentityConfig, MockIdentityService},
    plain_identity::{PlainIdentityConfig, PlainIdentityService},
};
use crate::models::{Credentials, Profile};

/// Configuration options for the identity service the desk signs in against.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "type")]
pub enum IdentityConfig {
    #[serde(rename = "mock")]
    Mock(MockIdentityConfig),
    #[serde(rename = "plain")]
    Plain(PlainIdentityConfig),
}

/// Exchanges credentials for a token, and a token for a profile.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    fn get_name(&self) -> &str;
    fn get_type(&self) -> &str;
    async fn login(&self, credentials: &Credentials) -> Result<String, String>;
    /// Must return the same profile for the same token every time.
    async fn fetch_profile(&self, token: &str) -> Result<Profile, String>;
}

/// Create an identity service from a given config.
pub fn create_identity_service(config: &IdentityConfig) -> Arc<dyn IdentityService> {
    match config {
        IdentityConfig::Mock(cfg) => Arc::new(MockIdentityService::new(cfg)),
        IdentityConfig::Plain(cfg) => Arc::new(PlainIdentityService::new(cfg)),
    }
}
