// Re-exports so callers can "use crate::config::*".
pub mod logging;
pub mod navigation;
pub mod routes;
pub mod store;
pub mod types;

pub use logging::*;
pub use navigation::*;
pub use routes::*;
pub use store::*;
pub use types::*;
