use serde_json::Value;
use thiserror::Error;

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A failed request, normalized.
///
/// Transport failures, non-2xx responses and envelopes whose `status` is not
/// `"success"` all end up in this one shape.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct Error {
    /// Human-readable message, chosen by [`error_message`](crate::error_message).
    pub message: String,

    /// The unprocessed `errors` value from the server, if any.
    pub errors: Option<Value>,

    /// HTTP status code, when a response was received at all.
    pub status: Option<u16>,
}
