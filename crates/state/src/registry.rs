use std::any::Any;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;
use uuid::Uuid;

use crate::{Container, Error, State};

static GLOBAL_REGISTRY: LazyLock<Arc<StoreRegistry>> =
    LazyLock::new(|| Arc::new(StoreRegistry::new()));

/// Identity of one binding between a consumer and its container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingId(Uuid);

impl BindingId {
    /// Creates a fresh, unique binding identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BindingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Maps binding identities to their containers.
///
/// Containers are created lazily and exactly once per binding. Each binding
/// has its own init cell, so concurrent first accesses to one binding all
/// receive the same container while other bindings stay unaffected.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    containers: DashMap<BindingId, Arc<OnceCell<Box<dyn Any + Send + Sync>>>>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    #[must_use]
    pub fn global() -> Arc<Self> {
        GLOBAL_REGISTRY.clone()
    }

    /// Looks up the container of a binding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the binding holds another state type.
    pub fn get<S: State>(&self, id: BindingId) -> Result<Option<Container<S>>, Error> {
        let Some(cell) = self.containers.get(&id).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };

        cell.get().map_or(Ok(None), |container| downcast(id, &**container).map(Some))
    }

    /// Returns the container of a binding, creating it with `init` on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the binding holds another state type.
    pub async fn get_or_create<S, F, Fut>(&self, id: BindingId, init: F) -> Result<Container<S>, Error>
    where
        S: State,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Container<S>> + Send,
    {
        // The map guard must be released before awaiting.
        let cell = self.containers.entry(id).or_default().value().clone();

        let container = cell
            .get_or_init(|| async move {
                let container = init().await;
                debug!("created container for binding {}", id);
                Box::new(container) as Box<dyn Any + Send + Sync>
            })
            .await;

        downcast(id, &**container)
    }

    /// Drops the registry's reference to a binding's container. Returns
    /// whether one was registered.
    pub fn remove(&self, id: BindingId) -> bool {
        self.containers
            .remove(&id)
            .is_some_and(|(_, cell)| cell.initialized())
    }

    /// Number of registered containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    /// Whether no container is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<S: State>(id: BindingId, container: &(dyn Any + Send + Sync)) -> Result<Container<S>, Error> {
    container
        .downcast_ref::<Container<S>>()
        .cloned()
        .ok_or(Error::TypeMismatch(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::oneshot;

    use crate::StoreOptions;

    #[tokio::test]
    async fn test_get_or_create_initializes_once() {
        let registry = Arc::new(StoreRegistry::new());
        let id = BindingId::new();
        let inits = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let inits = inits.clone();
                tokio::spawn(async move {
                    registry
                        .get_or_create(id, || async move {
                            inits.fetch_add(1, Ordering::SeqCst);
                            Container::new(0u32, StoreOptions::in_memory()).await
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut containers = Vec::new();
        for task in tasks {
            containers.push(task.await.unwrap());
        }

        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert!(containers.iter().all(|c| c.ptr_eq(&containers[0])));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_bindings_get_distinct_containers() {
        let registry = StoreRegistry::new();

        let a = registry
            .get_or_create(BindingId::new(), || {
                Container::new(0u32, StoreOptions::in_memory())
            })
            .await
            .unwrap();
        let b = registry
            .get_or_create(BindingId::new(), || {
                Container::new(0u32, StoreOptions::in_memory())
            })
            .await
            .unwrap();

        assert!(!a.ptr_eq(&b));
    }

    #[tokio::test]
    async fn test_slow_init_does_not_block_other_bindings() {
        let registry = Arc::new(StoreRegistry::new());
        let slow = BindingId::new();
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let pending = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .get_or_create(slow, || async move {
                        started_tx.send(()).unwrap();
                        let _ = release_rx.await;
                        Container::new(0u32, StoreOptions::in_memory()).await
                    })
                    .await
                    .unwrap()
            }
        });
        started_rx.await.unwrap();

        let fast = tokio::time::timeout(
            Duration::from_secs(5),
            registry.get_or_create(BindingId::new(), || {
                Container::new(1u32, StoreOptions::in_memory())
            }),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(*fast.state(), 1);
        assert!(registry.get::<u32>(slow).unwrap().is_none());
        assert_eq!(registry.len(), 1);

        release_tx.send(()).unwrap();
        let container = pending.await.unwrap();
        assert!(registry.get::<u32>(slow).unwrap().unwrap().ptr_eq(&container));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let registry = StoreRegistry::new();
        let id = BindingId::new();

        registry
            .get_or_create(id, || Container::new(0u32, StoreOptions::in_memory()))
            .await
            .unwrap();

        assert!(matches!(
            registry.get::<String>(id),
            Err(Error::TypeMismatch(mismatched)) if mismatched == id
        ));
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = StoreRegistry::new();
        let id = BindingId::new();

        assert!(registry.get::<u32>(id).unwrap().is_none());
        registry
            .get_or_create(id, || Container::new(1u32, StoreOptions::in_memory()))
            .await
            .unwrap();

        assert!(registry.remove(id));
        assert!(registry.is_empty());
    }
}
