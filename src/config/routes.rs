use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::RouteDescriptor;
use crate::routing::defaults::{clinic_constant_routes, clinic_dynamic_routes};

/// The two route collections: always-present routes and role-gated routes
/// that are materialized once per session.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct RoutesConfig {
    #[serde(default = "clinic_constant_routes")]
    pub constant: Vec<RouteDescriptor>,
    #[serde(default = "clinic_dynamic_routes")]
    pub dynamic: Vec<RouteDescriptor>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        RoutesConfig {
            constant: clinic_constant_routes(),
            dynamic: clinic_dynamic_routes(),
        }
    }
}
