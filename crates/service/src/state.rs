use conduit_state::State;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default container shape of a service.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct ListState<T> {
    /// The last fetched page of resources.
    pub list: Vec<T>,

    /// The resource currently being viewed or edited.
    pub selected: Option<T>,

    /// Whether a fetch is in flight. Maintained by callers.
    pub loading: bool,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            selected: None,
            loading: false,
        }
    }
}

/// Container states a service can mirror list responses into.
pub trait ResourceState<T>: State {
    /// Replaces the held list.
    fn set_list(&mut self, items: Vec<T>);
}

impl<T: State> ResourceState<T> for ListState<T> {
    fn set_list(&mut self, items: Vec<T>) {
        self.list = items;
    }
}

/// The `data` of a list response.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    /// A page object: the items under `data`, plus whatever pagination
    /// fields the server sends.
    Page {
        /// The items.
        data: Vec<T>,
        /// Remaining fields, e.g. `total` or `page`.
        #[serde(flatten)]
        meta: Map<String, Value>,
    },

    /// A bare array of items.
    Items(Vec<T>),
}

impl<T> ListResponse<T> {
    /// The items, whichever shape the response had.
    #[must_use]
    pub fn items(&self) -> &[T] {
        match self {
            Self::Page { data, .. } => data,
            Self::Items(items) => items,
        }
    }

    /// Consumes the response, keeping only the items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Page { data, .. } => data,
            Self::Items(items) => items,
        }
    }
}
