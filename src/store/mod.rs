pub mod base;
pub mod cookie_file_store;
pub mod memory_store;
pub mod no_store;

// Re-export the primary items so code outside can do
// "use crate::store::{CredentialStore, create_store};"
pub use base::{create_store, CredentialStore};
