use thiserror::Error;

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by services.
#[derive(Debug, Error)]
pub enum Error {
    /// The response data did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The payload could not be serialized.
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// An operation addressing one resource was called with a blank id.
    #[error("{0} requires a non-empty id")]
    MissingId(&'static str),

    /// The request failed.
    #[error(transparent)]
    Request(#[from] conduit_request::Error),

    /// The binding's container could not be resolved.
    #[error(transparent)]
    State(#[from] conduit_state::Error),

    /// The store was requested but the service was built without one.
    #[error("service has no store configured")]
    StoreNotConfigured,
}
