use conduit_store::StoreError;
use thiserror::Error;

/// Errors that can occur in this crate.
///
/// The in-memory store never fails; the type exists to satisfy the `Store`
/// contract.
#[derive(Clone, Debug, Error)]
#[error("memory store error")]
pub struct Error;

impl StoreError for Error {}
