use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, watch};
use tracing::trace;

use crate::PersistOptions;

/// Bounds every container state must satisfy.
pub trait State: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> State for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Options for building a container.
#[derive(Clone, Debug, Default)]
pub struct StoreOptions {
    persist: Option<PersistOptions>,
}

impl StoreOptions {
    /// A purely in-memory container. No I/O ever happens.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A container whose snapshot is loaded at creation and written back
    /// after every commit.
    #[must_use]
    pub const fn persisted(persist: PersistOptions) -> Self {
        Self {
            persist: Some(persist),
        }
    }
}

struct Inner<S> {
    initial: Arc<S>,
    sender: watch::Sender<Arc<S>>,
    commit_lock: Mutex<()>,
    persist: Option<PersistOptions>,
}

/// A state container.
///
/// Holds an immutable snapshot of `S`. Every transition is a commit made by
/// [`update`](Self::update), [`set`](Self::set) or [`reset`](Self::reset):
/// the new snapshot replaces the old one, subscribers are notified, and a
/// persisted container writes the snapshot through to its backend.
///
/// Clones are cheap and refer to the same container.
pub struct Container<S> {
    inner: Arc<Inner<S>>,
}

impl<S: State> Container<S> {
    /// Builds a container. With persistence configured, the stored snapshot
    /// is loaded (and migrated if needed) before this returns, so the first
    /// read already sees it.
    pub async fn new(initial: S, options: StoreOptions) -> Self {
        let initial = Arc::new(initial);

        let current = match &options.persist {
            Some(persist) => persist
                .load(initial.as_ref())
                .await
                .map_or_else(|| initial.clone(), Arc::new),
            None => initial.clone(),
        };

        let (sender, _) = watch::channel(current);

        Self {
            inner: Arc::new(Inner {
                initial,
                sender,
                commit_lock: Mutex::new(()),
                persist: options.persist,
            }),
        }
    }

    /// The current snapshot.
    ///
    /// Snapshots are immutable; cloning one out and changing the clone never
    /// affects the container.
    #[must_use]
    pub fn state(&self) -> Arc<S> {
        self.inner.sender.borrow().clone()
    }

    /// Applies `selector` to the current snapshot.
    pub fn select<R, F>(&self, selector: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        selector(self.inner.sender.borrow().as_ref())
    }

    /// Subscribes to commits. The receiver starts at the current snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<S>> {
        self.inner.sender.subscribe()
    }

    /// Commits the state produced by `producer`, which receives an owned copy
    /// of the current snapshot.
    ///
    /// Commits are serialized: concurrent updates apply one after another and
    /// each producer sees the previous commit.
    pub async fn update<F>(&self, producer: F)
    where
        F: FnOnce(S) -> S + Send,
    {
        let _guard = self.inner.commit_lock.lock().await;
        let draft = S::clone(&self.state());
        self.commit(Arc::new(producer(draft))).await;
    }

    /// Commits `state` as the new snapshot.
    pub async fn set(&self, state: S) {
        let _guard = self.inner.commit_lock.lock().await;
        self.commit(Arc::new(state)).await;
    }

    /// Restores the initial state the container was built with.
    pub async fn reset(&self) {
        let _guard = self.inner.commit_lock.lock().await;
        self.commit(self.inner.initial.clone()).await;
    }

    /// Whether both handles refer to the same container.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // Caller holds the commit lock.
    async fn commit(&self, next: Arc<S>) {
        self.inner.sender.send_replace(next.clone());
        trace!(
            "committed snapshot ({} subscribers)",
            self.inner.sender.receiver_count()
        );

        if let Some(persist) = &self.inner.persist {
            persist.save(next.as_ref()).await;
        }
    }
}

impl<S> Clone for Container<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> Debug for Container<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("persist", &self.inner.persist)
            .finish_non_exhaustive()
    }
}

/// A container together with its custom methods.
///
/// Derefs to the [`Container`], so `update`, `reset` and `state` are called
/// directly on the handle; custom methods live behind [`methods`](Self::methods).
#[derive(Clone, Debug)]
pub struct StoreHandle<S, M> {
    container: Container<S>,
    methods: M,
}

impl<S, M> StoreHandle<S, M> {
    /// The underlying container.
    pub const fn container(&self) -> &Container<S> {
        &self.container
    }

    /// The custom methods.
    pub const fn methods(&self) -> &M {
        &self.methods
    }
}

impl<S, M> Deref for StoreHandle<S, M> {
    type Target = Container<S>;

    fn deref(&self) -> &Self::Target {
        &self.container
    }
}

/// Builds a container and its custom methods.
///
/// `methods` receives the container itself: its `set`/`update` commit new
/// state and its `state` reads the live snapshot, so methods can build on
/// each other through shared state.
pub async fn create_store<S, M, F>(initial: S, options: StoreOptions, methods: F) -> StoreHandle<S, M>
where
    S: State,
    F: FnOnce(&Container<S>) -> M,
{
    let container = Container::new(initial, options).await;
    let methods = methods(&container);

    StoreHandle { container, methods }
}
