//! Library exports for ophthadesk, shared between the binary and tests.

pub mod config;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod navigation;
pub mod routing;
pub mod session;
pub mod shell;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
