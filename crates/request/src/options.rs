use std::fmt::{Debug, Formatter};

use reqwest::header::HeaderMap;
use serde_json::Value;

type Callback = Box<dyn FnOnce(Option<&Value>) + Send>;

/// Per-call request options.
///
/// `display_error` defaults to `true` and `display_success` to `false` when
/// left unset.
#[derive(Default)]
pub struct RequestOptions {
    /// Request payload. Sent as query parameters on `GET`, as a JSON body
    /// otherwise.
    pub data: Option<Value>,

    /// Query parameters (a JSON object).
    pub params: Option<Value>,

    /// Extra request headers.
    pub headers: HeaderMap,

    /// Notify on failure.
    pub display_error: Option<bool>,

    /// Notify on success, when the server sent a message.
    pub display_success: Option<bool>,

    on_success: Option<Callback>,
    on_error: Option<Callback>,
}

impl RequestOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the payload.
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the query parameters.
    #[must_use]
    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Adds a header. Invalid names or values are ignored with a warning.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            reqwest::header::HeaderName::from_bytes(name.as_bytes()),
            reqwest::header::HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!("ignoring invalid header {}", name),
        }
        self
    }

    /// Sets whether failures are notified.
    #[must_use]
    pub fn display_error(mut self, display: bool) -> Self {
        self.display_error = Some(display);
        self
    }

    /// Sets whether successes with a message are notified.
    #[must_use]
    pub fn display_success(mut self, display: bool) -> Self {
        self.display_success = Some(display);
        self
    }

    /// Fills `display_success` only if the caller left it unset.
    #[must_use]
    pub fn with_default_success(mut self, display: bool) -> Self {
        if self.display_success.is_none() {
            self.display_success = Some(display);
        }
        self
    }

    /// Called with the envelope's `data` on success.
    #[must_use]
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Option<&Value>) + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Called with the unprocessed `errors` value on failure, so callers can
    /// map field-keyed messages onto their own inputs.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Option<&Value>) + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub(crate) fn should_display_error(&self) -> bool {
        self.display_error.unwrap_or(true)
    }

    pub(crate) fn should_display_success(&self) -> bool {
        self.display_success.unwrap_or(false)
    }

    pub(crate) fn take_on_success(&mut self) -> Option<Callback> {
        self.on_success.take()
    }

    pub(crate) fn take_on_error(&mut self) -> Option<Callback> {
        self.on_error.take()
    }
}

impl Debug for RequestOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("data", &self.data)
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("display_error", &self.display_error)
            .field("display_success", &self.display_success)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RequestOptions::new();

        assert!(options.should_display_error());
        assert!(!options.should_display_success());
    }

    #[test]
    fn test_default_success_does_not_override_caller() {
        let options = RequestOptions::new()
            .display_success(false)
            .with_default_success(true);
        assert!(!options.should_display_success());

        let options = RequestOptions::new().with_default_success(true);
        assert!(options.should_display_success());
    }

    #[test]
    fn test_invalid_header_is_ignored() {
        let options = RequestOptions::new()
            .header("x-tenant", "acme")
            .header("bad header", "x");

        assert_eq!(options.headers.len(), 1);
        assert_eq!(options.headers["x-tenant"], "acme");
    }
}
