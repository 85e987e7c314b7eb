use std::fmt::Debug;

use async_trait::async_trait;
use conduit_request::{RequestOptions, Requester};
use tracing::debug;

use crate::{Error, PartialAccessConfig, Result};

/// Supplies the remote part of an access configuration.
#[async_trait]
pub trait RemoteConfigSource: Debug + Send + Sync + 'static {
    /// Fetches groups and permissions.
    async fn fetch(&self) -> Result<PartialAccessConfig>;
}

/// Fetches the configuration from an endpoint returning a
/// [`PartialAccessConfig`] as its envelope data.
///
/// Failures are not notified; configuration carries on with the local part.
#[derive(Clone, Debug)]
pub struct HttpConfigSource {
    requester: Requester,
    url: String,
}

impl HttpConfigSource {
    /// Fetches from `url` with `requester`.
    pub fn new(requester: Requester, url: impl Into<String>) -> Self {
        Self {
            requester,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RemoteConfigSource for HttpConfigSource {
    async fn fetch(&self) -> Result<PartialAccessConfig> {
        debug!("fetching access configuration from {}", self.url);

        let data = self
            .requester
            .get(&self.url, RequestOptions::new().display_error(false))
            .await
            .map_err(|e| Error::Remote(e.message))?;

        data.map_or_else(
            || Ok(PartialAccessConfig::default()),
            |data| serde_json::from_value(data).map_err(|e| Error::Remote(e.to_string())),
        )
    }
}
