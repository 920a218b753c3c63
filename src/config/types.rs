use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::navigation::NavigationConfig;
use super::routes::RoutesConfig;
use super::store::StoreConfig;
use crate::error::{DeskError, DeskResult};
use crate::identity::IdentityConfig;
use crate::models::route::normalize_path;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
}

impl ConfigV1 {
    /// Rejects configurations the guard cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        let nav = &self.navigation;
        if nav.max_redirects == 0 {
            return Err("navigation.max_redirects must be at least 1".to_string());
        }
        if nav.whitelist.iter().any(|p| p.trim().is_empty()) {
            return Err("navigation.whitelist contains an empty path".to_string());
        }
        let login_path = normalize_path(&nav.login_path);
        if !nav.whitelist.iter().any(|p| normalize_path(p) == login_path) {
            return Err(format!(
                "navigation.whitelist must contain the login path '{}'",
                nav.login_path
            ));
        }

        for route in &self.routes.dynamic {
            if let Some(unnamed) = route.find_unnamed() {
                return Err(format!(
                    "dynamic route '{}' has no name and could never be removed",
                    unnamed.path
                ));
            }
            if !route.meta.requires_roles() {
                return Err(format!(
                    "dynamic route '{}' declares no roles",
                    route.path
                ));
            }
        }
        Ok(())
    }
}

/// Path of the config file: `OPHTHADESK_CONFIG`, else `./config.yaml`.
pub fn config_path() -> String {
    std::env::var("OPHTHADESK_CONFIG").unwrap_or_else(|_| "./config.yaml".to_string())
}

/// Extracts and validates a config from any figment.
pub fn parse_config(figment: Figment) -> DeskResult<ConfigV1> {
    let config = figment
        .extract::<Config>()
        .map_err(|e| DeskError::Config(e.to_string()))?;
    let config = match config {
        Config::ConfigV1(c) => c,
    };
    config.validate().map_err(DeskError::Config)?;
    Ok(config)
}

/// Load config from the YAML file, with `OPHTHADESK_`-prefixed environment overrides.
pub fn load_config() -> ConfigV1 {
    let figment = Figment::new().merge(Yaml::file(config_path())).merge(
        Env::prefixed("OPHTHADESK_")
            .ignore(&["config"])
            .split("__"),
    );
    match parse_config(figment) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), String> {
    let schema = schema_for!(Config);
    let rendered = serde_json::to_string_pretty(&schema).map_err(|e| e.to_string())?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardMode;

    fn parse(yaml: &str) -> Result<ConfigV1, String> {
        parse_config(Figment::new().merge(Yaml::string(yaml))).map_err(|e| e.to_string())
    }

    const MINIMAL: &str = r#"
version: "1.0.0"
identity:
  type: mock
  name: canned
  token: mock-token-admin-123456
  username: Admin
  roles: [admin]
"#;

    #[test]
    fn test_minimal_config_uses_clinic_defaults() {
        let config = parse(MINIMAL).expect("minimal config should load");
        assert_eq!(config.navigation.login_path, "/login");
        assert_eq!(config.navigation.mode, GuardMode::Gating);
        assert_eq!(config.navigation.max_redirects, 10);
        assert!(config.store.enabled);
        assert!(!config.routes.constant.is_empty());
        assert!(config
            .routes
            .dynamic
            .iter()
            .all(|r| r.name.is_some() && r.meta.requires_roles()));
    }

    #[test]
    fn test_rejects_unnamed_dynamic_route() {
        let yaml = format!(
            "{}{}",
            MINIMAL,
            r#"
routes:
  dynamic:
    - path: /reports
      meta:
        roles: [admin]
"#
        );
        let err = parse(&yaml).expect_err("unnamed dynamic route must be rejected");
        assert!(err.contains("/reports"), "{}", err);
    }

    #[test]
    fn test_rejects_whitelist_without_login() {
        let yaml = format!(
            "{}{}",
            MINIMAL,
            r#"
navigation:
  login_path: /signin
  whitelist: [/login]
"#
        );
        assert!(parse(&yaml).is_err());
    }

    #[test]
    fn test_login_path_matches_whitelist_after_normalizing() {
        let yaml = format!(
            "{}{}",
            MINIMAL,
            r#"
navigation:
  login_path: /login/
  whitelist: [/login, "//about"]
"#
        );
        let config = parse(&yaml).expect("trailing slash on the login path is harmless");
        assert_eq!(config.navigation.login_path, "/login/");
    }

    #[test]
    fn test_rejects_unknown_version() {
        let yaml = MINIMAL.replace("1.0.0", "0.9.0");
        assert!(parse(&yaml).is_err());
    }
}
