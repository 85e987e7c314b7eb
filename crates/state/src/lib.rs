//! State containers: isolated, observable, copy-on-write stores built from an
//! initial state and a set of custom methods, optionally persisted to a
//! durable key-value backend with schema-version migration.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod container;
mod error;
mod persist;
mod registry;

pub use container::{Container, State, StoreHandle, StoreOptions, create_store};
pub use error::Error;
pub use persist::{Migration, PersistOptions};
pub use registry::{BindingId, StoreRegistry};
