use tracing::debug;

use crate::{AccessControl, Accessor, Error, Result};

const DEFAULT_DENIED_MESSAGE: &str = "Access denied";

/// Access checks for one user's roles.
#[derive(Clone, Debug)]
pub struct UserAccess {
    access: AccessControl,
    roles: Vec<String>,
}

impl UserAccess {
    pub(crate) const fn new(access: AccessControl, roles: Vec<String>) -> Self {
        Self { access, roles }
    }

    /// The bound roles.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Whether the user satisfies `accessor`. A user without roles never
    /// does.
    pub fn can(&self, accessor: impl Into<Accessor>, match_all: bool) -> bool {
        !self.roles.is_empty() && self.access.check(&self.roles, accessor, match_all)
    }

    /// Requires any requirement of `accessor` to be satisfied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Denied`] with `message`, or `"Access denied"`, when
    /// [`can`](Self::can) is `false`.
    pub fn must(&self, accessor: impl Into<Accessor>, message: Option<&str>) -> Result<()> {
        let accessor = accessor.into();
        if self.can(accessor.clone(), false) {
            return Ok(());
        }

        debug!("denied {:?} for roles {:?}", accessor, self.roles);
        Err(Error::Denied(
            message.unwrap_or(DEFAULT_DENIED_MESSAGE).to_string(),
        ))
    }

    /// `node` if the user satisfies `accessor`, `None` otherwise.
    pub fn can_render<N>(&self, node: N, accessor: impl Into<Accessor>, match_all: bool) -> Option<N> {
        self.can(accessor, match_all).then_some(node)
    }
}
