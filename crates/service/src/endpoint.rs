use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Base path of a service: fixed, or computed on every call.
#[derive(Clone)]
pub enum Endpoint {
    /// A fixed base path or URL.
    Static(String),

    /// Resolved at call time, for bases that depend on runtime state.
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Endpoint {
    /// An endpoint resolved by `resolver` on every call.
    pub fn dynamic<F>(resolver: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(resolver))
    }

    /// The current base.
    #[must_use]
    pub fn base(&self) -> String {
        match self {
            Self::Static(base) => base.clone(),
            Self::Dynamic(resolver) => resolver(),
        }
    }

    /// The base with one trailing slash removed and `suffix` appended.
    /// A leading `/` is added to a non-empty suffix that lacks one.
    #[must_use]
    pub fn resolve(&self, suffix: &str) -> String {
        let base = self.base();
        let base = base.strip_suffix('/').unwrap_or(&base);

        if suffix.is_empty() {
            base.to_string()
        } else if suffix.starts_with('/') {
            format!("{base}{suffix}")
        } else {
            format!("{base}/{suffix}")
        }
    }
}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(base) => f.debug_tuple("Static").field(base).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

impl From<&str> for Endpoint {
    fn from(base: &str) -> Self {
        Self::Static(base.to_string())
    }
}

impl From<String> for Endpoint {
    fn from(base: String) -> Self {
        Self::Static(base)
    }
}
