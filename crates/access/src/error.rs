use thiserror::Error;

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by access checks and configuration sources.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A required access check failed.
    #[error("{0}")]
    Denied(String),

    /// A remote configuration could not be fetched or decoded.
    #[error("remote access configuration unavailable: {0}")]
    Remote(String),
}
