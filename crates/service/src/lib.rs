//! CRUD services: one REST endpoint bound to at most one lazily created
//! state container.
//!
//! A [`Service`] issues `getAll`/`getById`/`create`/`update`/`delete` calls
//! through a [`Requester`](conduit_request::Requester) with centrally injected
//! notification defaults, and can mirror list responses into its container.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod endpoint;
mod error;
mod service;
mod state;

pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use service::{Service, ServiceBuilder};
pub use state::{ListResponse, ListState, ResourceState};
