//! Performs HTTP calls against endpoints that wrap every response in a
//! uniform `{ status, message, errors, data }` envelope.
//!
//! Each call unwraps the envelope, turns logical failures (`status` other
//! than `"success"`) into the same error path as transport failures, emits
//! at most one user-facing notification, and returns either the envelope's
//! `data` or a normalized [`Error`].
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod envelope;
mod error;
mod message;
mod notify;
mod options;

pub use client::Requester;
pub use config::{ApiConfig, AppConfig, ConfigHandle};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use message::error_message;
pub use notify::{Notifier, TracingNotifier};
pub use options::RequestOptions;
pub use reqwest::Method;
pub use reqwest::header::HeaderMap;
