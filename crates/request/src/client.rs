use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::{ApiConfig, ConfigHandle};
use crate::envelope::{Envelope, Parts};
use crate::error::{Error, Result};
use crate::message::error_message;
use crate::notify::{Notifier, TracingNotifier};
use crate::options::RequestOptions;

/// Everything known about a failed call before the message is chosen.
#[derive(Debug, Default)]
struct Failure {
    message: Option<String>,
    errors: Option<Value>,
    status: Option<u16>,
    transport: Option<String>,
}

impl Failure {
    fn transport(message: impl Into<String>) -> Self {
        Self {
            transport: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Performs requests against the configured API.
///
/// Cheap to clone. Holds no HTTP client: one is built per call from the
/// configuration current at that moment.
#[derive(Clone, Debug)]
pub struct Requester {
    config: ConfigHandle,
    notifier: Arc<dyn Notifier>,
}

impl Requester {
    /// A requester reading the process-wide configuration and logging
    /// notifications.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ConfigHandle::global())
    }

    /// A requester reading `config`.
    #[must_use]
    pub fn with_config(config: ConfigHandle) -> Self {
        Self {
            config,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Replaces the notifier.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The configuration this requester reads.
    #[must_use]
    pub const fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// `GET` request. `params` and `data` both become query parameters.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Option<Value>> {
        self.request(Method::GET, url, options).await
    }

    /// `POST` request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<Option<Value>> {
        self.request(Method::POST, url, options).await
    }

    /// `PUT` request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<Option<Value>> {
        self.request(Method::PUT, url, options).await
    }

    /// `DELETE` request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<Option<Value>> {
        self.request(Method::DELETE, url, options).await
    }

    /// Performs one request and unwraps its envelope.
    ///
    /// On success, notifies with the server's message if `display_success`
    /// is set, calls `on_success` with the envelope's `data`, and returns it.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`Error`] when the request could not be sent,
    /// the response status was not 2xx, or the envelope's `status` was not
    /// `"success"`. Before returning, notifies with the error message (unless
    /// `display_error` is `false`) and calls `on_error` with the raw `errors`.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        mut options: RequestOptions,
    ) -> Result<Option<Value>> {
        let config = self.config.current();
        debug!("{} {}", method, url);

        let outcome = self
            .send(
                &config.api,
                &method,
                url,
                &options.headers,
                options.params.as_ref(),
                options.data.as_ref(),
            )
            .await;

        match outcome {
            Ok((data, message)) => {
                if options.should_display_success() {
                    if let Some(message) = &message {
                        self.notifier.success(message);
                    }
                }

                if let Some(on_success) = options.take_on_success() {
                    on_success(data.as_ref());
                }

                debug!("{} {} succeeded", method, url);
                Ok(data)
            }
            Err(failure) => {
                let message = error_message(
                    failure.message.as_deref(),
                    failure.errors.as_ref(),
                    failure.transport.as_deref(),
                );

                if options.should_display_error() {
                    self.notifier.error(&message);
                }

                if let Some(on_error) = options.take_on_error() {
                    on_error(failure.errors.as_ref());
                }

                debug!(
                    "{} {} failed (status {:?}): {}",
                    method, url, failure.status, message
                );
                Err(Error {
                    message,
                    errors: failure.errors,
                    status: failure.status,
                })
            }
        }
    }

    async fn send(
        &self,
        api: &ApiConfig,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        params: Option<&Value>,
        data: Option<&Value>,
    ) -> std::result::Result<(Option<Value>, Option<String>), Failure> {
        let client = self
            .build_client(api)
            .map_err(|e| Failure::transport(e.to_string()))?;
        let url = resolve_url(api, url).map_err(Failure::transport)?;

        let is_read = method == Method::GET;
        let query = if is_read {
            query_pairs(&[params, data])
        } else {
            query_pairs(&[params])
        };

        let mut builder = client.request(method.clone(), url).headers(headers.clone());
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if !is_read {
            if let Some(data) = data {
                builder = builder.json(data);
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Failure::transport(e.to_string()))?;
        let status = response.status();
        let code = status.as_u16();

        let bytes = response.bytes().await.map_err(|e| Failure {
            status: Some(code),
            transport: Some(e.to_string()),
            ..Failure::default()
        })?;
        let body = parse_body(&bytes);

        if !status.is_success() {
            let parts = Parts::from_body(body);
            return Err(Failure {
                message: parts.message,
                errors: parts.errors,
                status: Some(code),
                transport: Some(format!("Request failed with status code {code}")),
            });
        }

        match Envelope::parse(body) {
            Envelope::Success { data, message } => Ok((data, message)),
            Envelope::Failure {
                status,
                message,
                errors,
            } => {
                debug!("envelope reported status {:?}", status);
                Err(Failure {
                    message,
                    errors,
                    status: Some(code),
                    transport: None,
                })
            }
        }
    }

    fn build_client(&self, api: &ApiConfig) -> reqwest::Result<Client> {
        let mut builder = Client::builder();
        if api.with_credentials {
            builder = builder.cookie_provider(self.config.cookies());
        }
        builder.build()
    }
}

impl Default for Requester {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_url(api: &ApiConfig, url: &str) -> std::result::Result<Url, String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Url::parse(url).map_err(|e| format!("invalid URL {url}: {e}"));
    }

    let base = api
        .base_url()
        .ok_or_else(|| format!("no base URL configured for {url}"))?;
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    );

    Url::parse(&joined).map_err(|e| format!("invalid URL {joined}: {e}"))
}

/// Flattens JSON objects into query pairs; later sources override earlier
/// ones key by key.
fn query_pairs(sources: &[Option<&Value>]) -> Vec<(String, String)> {
    let mut merged = Map::new();
    for source in sources.iter().flatten() {
        match source {
            Value::Object(fields) => {
                merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Value::Null => {}
            other => warn!("ignoring non-object query parameters: {}", other),
        }
    }

    let mut pairs = Vec::new();
    for (key, value) in merged {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                pairs.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (key.clone(), query_value(item))),
                );
            }
            other => pairs.push((key, query_value(&other))),
        }
    }

    pairs
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    Some(serde_json::from_slice(bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(bytes).into_owned())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn api(url: Option<&str>) -> ApiConfig {
        ApiConfig {
            url: url.map(ToString::to_string),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let url = resolve_url(&api(Some("http://localhost:8080/api/")), "/products").unwrap();

        assert_eq!(url.as_str(), "http://localhost:8080/api/products");
    }

    #[test]
    fn test_absolute_url_bypasses_base() {
        let url = resolve_url(&api(Some("http://localhost:8080")), "https://cdn.example.com/x").unwrap();

        assert_eq!(url.as_str(), "https://cdn.example.com/x");
    }

    #[test]
    fn test_relative_url_without_base_fails() {
        assert!(resolve_url(&api(None), "/products").is_err());
    }

    #[test]
    fn test_query_pairs_union_with_data_winning() {
        let params = json!({ "page": 1, "q": "shoe" });
        let data = json!({ "page": 2, "tags": ["a", "b"], "skip": null });

        let pairs = query_pairs(&[Some(&params), Some(&data)]);

        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "shoe".to_string()),
                ("tags".to_string(), "a".to_string()),
                ("tags".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b""), None);
        assert_eq!(parse_body(b"  \n"), None);
        assert_eq!(parse_body(br#"{"a":1}"#), Some(json!({ "a": 1 })));
        assert_eq!(parse_body(b"<html>"), Some(json!("<html>")));
    }
}
