//! Process-wide configuration consumed by every request.
//!
//! The configuration is read fresh at the start of each call, never cached
//! by a client, so swapping it (for example to point at another environment)
//! takes effect on the next request.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use tracing::info;

static GLOBAL_CONFIG: LazyLock<ConfigHandle> =
    LazyLock::new(|| ConfigHandle::new(AppConfig::default()));

/// API section of the configuration. Field names are camelCase on the wire:
/// `{ "url": ..., "isSameOrigin": ..., "withCredentials": ..., "origin": ... }`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    /// Base URL that relative request URLs are resolved against.
    pub url: Option<String>,

    /// Resolve relative URLs against `origin` (the host application's own
    /// origin) instead of `url`.
    pub is_same_origin: bool,

    /// Send and retain cookies across requests.
    pub with_credentials: bool,

    /// The host application's own origin, used in same-origin mode.
    pub origin: Option<String>,
}

impl ApiConfig {
    /// The base relative URLs resolve against under the current mode.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        if self.is_same_origin {
            self.origin.as_deref()
        } else {
            self.url.as_deref()
        }
    }
}

/// Top-level configuration: `{ "api": { ... } }`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Settings for the remote API.
    pub api: ApiConfig,
}

/// Shared, hot-swappable configuration plus the cookie jar used when
/// credentials are enabled. Clones share both.
#[derive(Clone, Debug)]
pub struct ConfigHandle {
    config: Arc<ArcSwap<AppConfig>>,
    cookies: Arc<Jar>,
}

impl ConfigHandle {
    /// Creates an independent handle holding `config`.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            cookies: Arc::new(Jar::default()),
        }
    }

    /// The process-wide handle used by [`Requester::new`](crate::Requester::new).
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_CONFIG.clone()
    }

    /// Replaces the configuration. In-flight requests keep the snapshot they
    /// started with.
    pub fn configure(&self, config: AppConfig) {
        info!("api configuration updated (base: {:?})", config.api.base_url());
        self.config.store(Arc::new(config));
    }

    /// The current configuration snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<AppConfig> {
        self.config.load_full()
    }

    pub(crate) fn cookies(&self) -> Arc<Jar> {
        self.cookies.clone()
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
