use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the guard treats a session whose roles have not been fetched yet.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GuardMode {
    /// Fetch roles and materialize role routes before letting the navigation through.
    #[default]
    Gating,
    /// Refresh roles in the background of the navigation and always let it through.
    Advisory,
}

/// Navigation guard settings.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct NavigationConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Paths reachable without a token. Must contain the login path.
    #[serde(default = "default_whitelist")]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub mode: GuardMode,
    /// Upper bound on redirects and replays within one navigation.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_whitelist() -> Vec<String> {
    vec![default_login_path()]
}

fn default_max_redirects() -> usize {
    10
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            login_path: default_login_path(),
            whitelist: default_whitelist(),
            mode: GuardMode::default(),
            max_redirects: default_max_redirects(),
        }
    }
}
