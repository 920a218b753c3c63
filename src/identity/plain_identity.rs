use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::IdentityService;
use crate::models::{Credentials, Profile};

/// Signing settings for the tokens this service issues.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct JwtConfig {
    pub iss: String,
    /// Lifetime in seconds.
    pub exp: i64,
    pub secret: String,
}

/// Represents a single user entry (username + password + roles).
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct PlainUserEntry {
    pub username: String,
    pub password: String,
    pub roles: Option<Vec<String>>,
}

/// A fixed list of desk accounts, for clinics without a directory service.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct PlainIdentityConfig {
    pub name: String,
    pub users: Vec<PlainUserEntry>,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub latency_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iss: String,
    iat: i64,
    exp: i64,
    jti: String,
    username: String,
    roles: Vec<String>,
}

/// Checks credentials against the configured users and issues HS256 tokens
/// carrying the user's roles. Profiles are read back from the token itself.
pub struct PlainIdentityService {
    pub config: PlainIdentityConfig,
}

impl PlainIdentityService {
    pub fn new(config: &PlainIdentityConfig) -> Self {
        info!(
            "Creating plain identity service '{}' with {} users",
            config.name,
            config.users.len()
        );
        Self {
            config: config.clone(),
        }
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn issue_token(&self, entry: &PlainUserEntry) -> Result<String, String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: format!("{}-{}", self.config.name, entry.username),
            iss: self.config.jwt.iss.clone(),
            iat: now,
            exp: now + self.config.jwt.exp,
            jti: uuid::Uuid::new_v4().to_string(),
            username: entry.username.clone(),
            roles: entry.roles.clone().unwrap_or_default(),
        };
        let key = EncodingKey::from_secret(self.config.jwt.secret.as_ref());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| format!("Failed to encode token: {}", e))
    }
}

#[async_trait]
impl IdentityService for PlainIdentityService {
    fn get_name(&self) -> &str {
        &self.config.name
    }

    fn get_type(&self) -> &str {
        "plain"
    }

    async fn login(&self, credentials: &Credentials) -> Result<String, String> {
        self.simulate_latency().await;

        if credentials.username.is_empty() {
            return Err("No username given".to_string());
        }

        debug!("Plain login attempt for user '{}'", credentials.username);
        let entry = self
            .config
            .users
            .iter()
            .find(|e| e.username == credentials.username && e.password == credentials.password);

        match entry {
            Some(entry) => self.issue_token(entry),
            None => {
                warn!("Rejected login for user '{}'", credentials.username);
                Err("Wrong username or password".to_string())
            }
        }
    }

    async fn fetch_profile(&self, token: &str) -> Result<Profile, String> {
        self.simulate_latency().await;

        if token.is_empty() {
            return Err("Empty token".to_string());
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_issuer(&[self.config.jwt.iss.as_str()]);

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt.secret.as_ref()),
            &validation,
        )
        .map_err(|e| format!("Failed to decode token: {}", e))?;

        Ok(Profile::new(decoded.claims.username, decoded.claims.roles))
    }
}
