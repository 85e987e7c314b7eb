use std::fmt::Debug;

use tracing::{error, info};

/// Receives the user-facing notification of a request (a toast, a status
/// line). At most one notification is emitted per request.
pub trait Notifier: Debug + Send + Sync + 'static {
    /// A request succeeded and asked for its message to be shown.
    fn success(&self, message: &str);

    /// A request failed and asked for its message to be shown.
    fn error(&self, message: &str);
}

/// Default notifier: writes notifications to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "conduit::notify", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "conduit::notify", "{}", message);
    }
}
