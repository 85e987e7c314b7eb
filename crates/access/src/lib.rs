//! Access control: decides whether a set of roles satisfies role, group or
//! permission requirements.
//!
//! An [`AccessControl`] starts unconfigured and denies everything until
//! [`configure`](AccessControl::configure) completes, optionally merging in a
//! remotely fetched configuration. [`UserAccess`] binds one user's roles for
//! the `can`/`must`/`can_render` checks a UI makes.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod accessor;
mod config;
mod control;
mod error;
mod source;
mod user;

pub use accessor::Accessor;
pub use config::{AccessConfig, AccessMode, PartialAccessConfig};
pub use control::{AccessControl, AccessState, Phase};
pub use error::{Error, Result};
pub use source::{HttpConfigSource, RemoteConfigSource};
pub use user::UserAccess;
