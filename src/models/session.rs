use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The identity held by the desk for the current browser session.
///
/// An empty token means logged out. Roles are only ever populated while a
/// token is held.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub roles: BTreeSet<String>,
}

impl Session {
    /// A session restored from a persisted token, before any profile fetch.
    pub fn with_token(token: impl Into<String>) -> Self {
        Session {
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn has_roles(&self) -> bool {
        !self.roles.is_empty()
    }

    /// Drops token and roles. The display name is kept for greeting screens.
    pub fn clear_credentials(&mut self) {
        self.token.clear();
        self.roles.clear();
    }

    pub fn clear(&mut self) {
        *self = Session::default();
    }
}

/// What the identity service knows about the holder of a token.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub roles: Vec<String>,
}

impl Profile {
    pub fn new(username: impl Into<String>, roles: Vec<String>) -> Self {
        Profile {
            username: username.into(),
            roles,
        }
    }

    pub fn role_set(&self) -> BTreeSet<String> {
        self.roles.iter().cloned().collect()
    }
}

/// Login form input. `code` is the captcha the login screen collects.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
            code: None,
        }
    }
}
