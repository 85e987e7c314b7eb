use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use conduit_request::{Method, RequestOptions, Requester};
use conduit_state::{BindingId, Container, State, StoreOptions, StoreRegistry};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Endpoint, Error, ListResponse, ListState, ResourceState, Result};

struct StoreConfig<S> {
    initial: S,
    options: StoreOptions,
}

/// Builds a [`Service`].
pub struct ServiceBuilder<T, C = T, U = C, S = ListState<T>> {
    endpoint: Endpoint,
    requester: Option<Requester>,
    registry: Option<Arc<StoreRegistry>>,
    store: Option<StoreConfig<S>>,
    sync_with_store: bool,
    _marker: PhantomData<fn() -> (T, C, U)>,
}

impl<T, C, U, S> ServiceBuilder<T, C, U, S>
where
    S: State,
{
    /// Starts a builder for `endpoint`.
    pub fn new(endpoint: impl Into<Endpoint>) -> Self {
        Self {
            endpoint: endpoint.into(),
            requester: None,
            registry: None,
            store: None,
            sync_with_store: false,
            _marker: PhantomData,
        }
    }

    /// Gives the service a container, created from `initial` on first access.
    #[must_use]
    pub fn store(mut self, initial: S, options: StoreOptions) -> Self {
        self.store = Some(StoreConfig { initial, options });
        self
    }

    /// Gives the service an in-memory container starting at `S::default()`.
    #[must_use]
    pub fn default_store(self) -> Self
    where
        S: Default,
    {
        self.store(S::default(), StoreOptions::in_memory())
    }

    /// Mirrors every `get_all` response into the container's list.
    #[must_use]
    pub fn sync_with_store(mut self, sync: bool) -> Self {
        self.sync_with_store = sync;
        self
    }

    /// Sets the requester. Defaults to [`Requester::new`].
    #[must_use]
    pub fn requester(mut self, requester: Requester) -> Self {
        self.requester = Some(requester);
        self
    }

    /// Sets the registry holding the container. Defaults to
    /// [`StoreRegistry::global`].
    #[must_use]
    pub fn registry(mut self, registry: Arc<StoreRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the service under a fresh binding.
    #[must_use]
    pub fn build(self) -> Service<T, C, U, S> {
        let binding = BindingId::new();
        debug!("binding {} to {:?}", binding, self.endpoint);

        Service {
            endpoint: self.endpoint,
            requester: self.requester.unwrap_or_default(),
            registry: self.registry.unwrap_or_else(StoreRegistry::global),
            binding,
            store: self.store.map(Arc::new),
            sync_with_store: self.sync_with_store,
            _marker: PhantomData,
        }
    }
}

/// A REST resource bound to at most one container.
///
/// `T` is the resource, `C` the create payload, `U` the update payload and
/// `S` the container state. Clones share the binding, so every clone
/// resolves to the same container.
pub struct Service<T, C = T, U = C, S = ListState<T>> {
    endpoint: Endpoint,
    requester: Requester,
    registry: Arc<StoreRegistry>,
    binding: BindingId,
    store: Option<Arc<StoreConfig<S>>>,
    sync_with_store: bool,
    _marker: PhantomData<fn() -> (T, C, U)>,
}

impl<T, C, U, S> Service<T, C, U, S>
where
    T: State,
    C: Serialize + Sync,
    U: Serialize + Sync,
    S: ResourceState<T>,
{
    /// Starts a builder for `endpoint`.
    pub fn builder(endpoint: impl Into<Endpoint>) -> ServiceBuilder<T, C, U, S> {
        ServiceBuilder::new(endpoint)
    }

    /// The binding identity shared by this service and its clones.
    #[must_use]
    pub const fn binding(&self) -> BindingId {
        self.binding
    }

    /// The endpoint with `suffix` appended.
    #[must_use]
    pub fn endpoint(&self, suffix: &str) -> String {
        self.endpoint.resolve(suffix)
    }

    /// Fetches the list. `params`, when given, replaces the options' query
    /// parameters.
    ///
    /// With store sync enabled, the container's list is overwritten with the
    /// returned items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] if the request fails, [`Error::Decode`] if
    /// the data is neither an array nor a page of `T`, and
    /// [`Error::StoreNotConfigured`] if sync is enabled without a store.
    pub async fn get_all(
        &self,
        params: Option<Value>,
        mut options: RequestOptions,
    ) -> Result<Option<ListResponse<T>>> {
        if params.is_some() {
            options.params = params;
        }

        let data = self.requester.get(&self.endpoint(""), options).await?;
        let response = decode::<ListResponse<T>>(data)?;

        if self.sync_with_store {
            self.sync(response.as_ref()).await?;
        }

        Ok(response)
    }

    /// Fetches one resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingId`] for a blank id, otherwise as
    /// [`get_all`](Self::get_all).
    pub async fn get_by_id(&self, id: impl Display, options: RequestOptions) -> Result<Option<T>> {
        let url = self.item_url(&id, "get_by_id")?;
        decode(self.requester.get(&url, options).await?)
    }

    /// Creates a resource. The container is left untouched.
    ///
    /// Success notifications are shown unless the options say otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `data` does not serialize, otherwise as
    /// [`get_all`](Self::get_all).
    pub async fn create(&self, data: &C, options: RequestOptions) -> Result<Option<T>> {
        let options = options
            .data(serde_json::to_value(data).map_err(Error::Encode)?)
            .with_default_success(true);

        decode(self.requester.post(&self.endpoint(""), options).await?)
    }

    /// Updates a resource. The container is left untouched.
    ///
    /// Success notifications are shown unless the options say otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingId`] for a blank id and [`Error::Encode`] if
    /// `data` does not serialize, otherwise as [`get_all`](Self::get_all).
    pub async fn update(
        &self,
        id: impl Display,
        data: &U,
        options: RequestOptions,
    ) -> Result<Option<T>> {
        let url = self.item_url(&id, "update")?;
        let options = options
            .data(serde_json::to_value(data).map_err(Error::Encode)?)
            .with_default_success(true);

        decode(self.requester.put(&url, options).await?)
    }

    /// Deletes a resource. The container is left untouched.
    ///
    /// Success notifications are shown unless the options say otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingId`] for a blank id, or [`Error::Request`].
    pub async fn delete(&self, id: impl Display, options: RequestOptions) -> Result<Option<Value>> {
        let url = self.item_url(&id, "delete")?;

        Ok(self
            .requester
            .delete(&url, options.with_default_success(true))
            .await?)
    }

    /// Calls a non-CRUD route below the endpoint, e.g. `/1/approve`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] if the request fails.
    pub async fn custom_action(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>> {
        Ok(self
            .requester
            .request(method, &self.endpoint(path), options)
            .await?)
    }

    /// The binding's container, created on first access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreNotConfigured`] if the service was built without
    /// a store.
    pub async fn store(&self) -> Result<Container<S>> {
        let config = self.store.as_ref().ok_or(Error::StoreNotConfigured)?;
        let initial = config.initial.clone();
        let options = config.options.clone();

        Ok(self
            .registry
            .get_or_create(self.binding, || Container::new(initial, options))
            .await?)
    }

    /// Applies `selector` to the container's current state.
    ///
    /// # Errors
    ///
    /// As [`store`](Self::store).
    pub async fn use_store<R, F>(&self, selector: F) -> Result<R>
    where
        F: FnOnce(&S) -> R,
    {
        Ok(self.store().await?.select(selector))
    }

    async fn sync(&self, response: Option<&ListResponse<T>>) -> Result<()> {
        let store = self.store().await?;

        let Some(response) = response else {
            warn!(
                "{} returned no list data; store left unchanged",
                self.endpoint("")
            );
            return Ok(());
        };

        let items = response.items().to_vec();
        debug!("syncing {} items into binding {}", items.len(), self.binding);
        store
            .update(move |mut state| {
                state.set_list(items);
                state
            })
            .await;

        Ok(())
    }

    fn item_url(&self, id: &impl Display, operation: &'static str) -> Result<String> {
        let id = id.to_string();
        if id.trim().is_empty() {
            return Err(Error::MissingId(operation));
        }

        Ok(self.endpoint(&id))
    }
}

impl<T, C, U, S> Clone for Service<T, C, U, S> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            requester: self.requester.clone(),
            registry: self.registry.clone(),
            binding: self.binding,
            store: self.store.clone(),
            sync_with_store: self.sync_with_store,
            _marker: PhantomData,
        }
    }
}

impl<T, C, U, S> Debug for Service<T, C, U, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("endpoint", &self.endpoint)
            .field("binding", &self.binding)
            .field("store", &self.store.is_some())
            .field("sync_with_store", &self.sync_with_store)
            .finish_non_exhaustive()
    }
}

fn decode<R: DeserializeOwned>(data: Option<Value>) -> Result<Option<R>> {
    data.map(serde_json::from_value)
        .transpose()
        .map_err(Error::Decode)
}
