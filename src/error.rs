//! Error taxonomy for the desk core.
//!
//! The collaborator traits (credential store, identity service, router) report
//! failures as plain strings. Session and navigation code wraps them here so
//! callers can tell a recoverable storage hiccup from a broken route table.

use thiserror::Error;

pub type DeskResult<T> = Result<T, DeskError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeskError {
    /// Writing the credential store failed. Logged and otherwise ignored.
    #[error("failed to persist credential: {0}")]
    StorageWrite(String),

    /// The identity service could not produce a usable profile.
    #[error("failed to fetch roles: {0}")]
    RoleFetch(String),

    /// Retracting dynamic routes failed; the route table is in an unknown state.
    #[error("failed to remove route: {0}")]
    RouteRemoval(String),

    #[error("failed to register route: {0}")]
    RouteRegistration(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("a login is already in progress")]
    LoginInFlight,

    #[error("session is already authenticated")]
    AlreadyAuthenticated,

    #[error("session has no token")]
    Unauthenticated,

    #[error("navigation to '{path}' redirected more than {limit} times")]
    TooManyRedirects { path: String, limit: usize },

    #[error("no route matches '{0}'")]
    Unmatched(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DeskError {
    fn from(e: std::io::Error) -> Self {
        DeskError::Io(e.to_string())
    }
}
