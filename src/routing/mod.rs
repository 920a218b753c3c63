pub mod defaults;
pub mod permission;
pub mod reset;
pub mod table;

pub use permission::{filter_dynamic_routes, MenuItem, PermissionStore, RouteDelta};
pub use reset::reset_router;
pub use table::{Resolution, RouteTable, Router};
