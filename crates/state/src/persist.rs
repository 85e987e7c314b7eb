//! Durable snapshots of container state.
//!
//! A snapshot is stored as JSON `{ "version": n, "state": ... }` under the
//! container's persistence name.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use conduit_store::{Store, Store1};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::State;

/// Transforms a persisted state written under an older schema version into
/// the current shape. Receives the raw persisted state and its version.
pub type Migration = Arc<dyn Fn(Value, u32) -> Value + Send + Sync>;

#[derive(Debug, Deserialize, Serialize)]
struct PersistedSnapshot<T> {
    version: u32,
    state: T,
}

/// Erases the concrete `Store` type so containers stay generic over state only.
#[async_trait]
trait SnapshotBackend: Debug + Send + Sync + 'static {
    async fn load(&self, key: &str) -> Result<Option<Bytes>, String>;

    async fn save(&self, key: &str, bytes: Bytes) -> Result<(), String>;
}

#[async_trait]
impl<T> SnapshotBackend for T
where
    T: Store,
{
    async fn load(&self, key: &str) -> Result<Option<Bytes>, String> {
        self.get(key).await.map_err(|e| e.to_string())
    }

    async fn save(&self, key: &str, bytes: Bytes) -> Result<(), String> {
        self.put(key, bytes).await.map_err(|e| e.to_string())
    }
}

/// Persistence settings for a container.
#[derive(Clone)]
pub struct PersistOptions {
    name: String,
    version: u32,
    backend: Arc<dyn SnapshotBackend>,
    migrate: Option<Migration>,
}

impl PersistOptions {
    /// Persists under `name` in `backend`, at schema version 0.
    pub fn new<B>(name: impl Into<String>, backend: B) -> Self
    where
        B: Store,
    {
        Self {
            name: name.into(),
            version: 0,
            backend: Arc::new(backend),
            migrate: None,
        }
    }

    /// Persists under `name` within `scope` of `backend`, so several
    /// applications can share one backend with the same names.
    pub fn scoped<B>(backend: &B, scope: impl Into<String> + Send, name: impl Into<String>) -> Self
    where
        B: Store1,
    {
        Self::new(name, backend.scope(scope))
    }

    /// Sets the current schema version.
    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the migration applied to snapshots written under another version.
    #[must_use]
    pub fn migrate<F>(mut self, migrate: F) -> Self
    where
        F: Fn(Value, u32) -> Value + Send + Sync + 'static,
    {
        self.migrate = Some(Arc::new(migrate));
        self
    }

    /// The key the snapshot is stored under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the persisted snapshot and merges it over `initial`.
    ///
    /// Returns `None` whenever there is nothing usable: no entry, a read
    /// error, a corrupt payload, a version mismatch without a migration, or a
    /// merged state that no longer deserializes.
    pub(crate) async fn load<S: State>(&self, initial: &S) -> Option<S> {
        let bytes = match self.backend.load(&self.name).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("no persisted snapshot for {}", self.name);
                return None;
            }
            Err(e) => {
                warn!("failed to read persisted snapshot {}: {}", self.name, e);
                return None;
            }
        };

        let snapshot: PersistedSnapshot<Value> = match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("discarding corrupt snapshot {}: {}", self.name, e);
                return None;
            }
        };

        let state = if snapshot.version == self.version {
            snapshot.state
        } else if let Some(migrate) = &self.migrate {
            info!(
                "migrating snapshot {} from version {} to {}",
                self.name, snapshot.version, self.version
            );
            migrate(snapshot.state, snapshot.version)
        } else {
            warn!(
                "snapshot {} has version {} but no migration to {} was provided",
                self.name, snapshot.version, self.version
            );
            return None;
        };

        match merge_shallow(initial, state) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("discarding unusable snapshot {}: {}", self.name, e);
                None
            }
        }
    }

    /// Writes `state` through to the backend. Failures are logged only.
    pub(crate) async fn save<S: State>(&self, state: &S) {
        let snapshot = PersistedSnapshot {
            version: self.version,
            state,
        };

        let bytes = match serde_json::to_vec(&snapshot) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                warn!("failed to serialize snapshot {}: {}", self.name, e);
                return;
            }
        };

        if let Err(e) = self.backend.save(&self.name, bytes).await {
            warn!("failed to write snapshot {}: {}", self.name, e);
        }
    }
}

impl Debug for PersistOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistOptions")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("backend", &self.backend)
            .field("migrate", &self.migrate.is_some())
            .finish()
    }
}

/// Persisted top-level keys replace the defaults' top-level keys; nested
/// values are replaced whole.
fn merge_shallow<S: State>(initial: &S, persisted: Value) -> serde_json::Result<S> {
    let merged = match (serde_json::to_value(initial)?, persisted) {
        (Value::Object(mut defaults), Value::Object(persisted)) => {
            defaults.extend(persisted);
            Value::Object(defaults)
        }
        (_, persisted) => persisted,
    };

    serde_json::from_value(merged)
}
