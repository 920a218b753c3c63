pub mod base;
pub mod mock_identity;
pub mod plain_identity;

pub use base::{create_identity_service, IdentityConfig, IdentityService};
