//! Abstract interfaces for the durable key-value storage that persisted
//! state containers write their snapshots to.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for store errors.
pub trait StoreError: Debug + Error + Send + Sync + 'static {}

/// A key-value store with asynchronous operations.
///
/// Writes are last-write-wins: implementations never compare versions or
/// fence concurrent writers.
#[async_trait]
pub trait Store: Clone + Debug + Send + Sync + 'static {
    /// The error type returned by every operation.
    type Error: StoreError;

    /// Retrieves the value stored under a key, if any.
    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error>;

    /// Stores a value, replacing whatever was there.
    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error>;
}

/// A store that must be scoped (namespaced) before use.
///
/// Scopes let several applications share one backend without their
/// persistence names colliding.
pub trait Store1: Clone + Send + Sync + 'static {
    /// The error type of the scoped store.
    type Error: StoreError;

    /// The store produced by applying a scope.
    type Scoped: Store<Error = Self::Error>;

    /// Applies a scope and returns a usable store.
    fn scope<S: Into<String> + Send>(&self, scope: S) -> Self::Scoped;
}
