#![allow(dead_code)]

use std::sync::Arc;

use figment::{
    providers::{Format, Yaml},
    Figment,
};
use ophthadesk::config::{parse_config, ConfigV1};
use ophthadesk::metrics::Metrics;
use ophthadesk::state::DeskState;

/// A mock identity that answers instantly with the given roles.
pub fn mock_config(roles: &[&str]) -> String {
    format!(
        r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
identity:
  type: mock
  name: "Mock desk"
  token: mock-token-admin-123456
  username: Admin
  roles: [{}]
  login_latency_ms: 0
  profile_latency_ms: 0
store:
  enabled: true
  type: memory
"#,
        roles.join(", ")
    )
}

pub fn config_from(yaml: &str) -> ConfigV1 {
    parse_config(Figment::new().merge(Yaml::string(yaml))).expect("test config should load")
}

pub async fn build_desk(yaml: &str) -> DeskState {
    DeskState::build(Arc::new(config_from(yaml)), Metrics::new()).await
}

/// Names of the role-gated routes currently in the live table.
pub fn dynamic_route_names(state: &DeskState) -> Vec<String> {
    state
        .router
        .get_routes()
        .into_iter()
        .filter(|r| r.meta.requires_roles())
        .filter_map(|r| r.name)
        .collect()
}

/// A cookie jar path no other test uses.
pub fn temp_cookie_jar() -> String {
    std::env::temp_dir()
        .join(format!("ophthadesk-it-{}", uuid::Uuid::new_v4()))
        .join("cookies.json")
        .to_string_lossy()
        .into_owned()
}
