use thiserror::Error;

use crate::BindingId;

/// Errors that can occur in this crate.
///
/// Persistence failures never show up here: they are logged and the
/// container falls back to its initial state.
#[derive(Debug, Error)]
pub enum Error {
    /// A binding was registered with one state type and requested with another.
    #[error("binding {0} holds a container of a different state type")]
    TypeMismatch(BindingId),
}
