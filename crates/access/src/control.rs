use std::collections::HashMap;

use conduit_state::{Container, StoreOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{AccessConfig, AccessMode, Accessor, UserAccess};

/// Configuration lifecycle.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// `configure` was never called.
    #[default]
    Unconfigured,

    /// A `configure` call is in progress.
    Configuring,

    /// Configuration completed; checks are answered.
    Ready,
}

/// The resolved configuration checks run against.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct AccessState {
    /// Configuration lifecycle.
    pub phase: Phase,

    /// Group name to member roles.
    pub groups: HashMap<String, Vec<String>>,

    /// Role to granted permissions.
    pub permissions: HashMap<String, Vec<String>>,
}

impl AccessState {
    /// Whether `roles` satisfy `accessor`.
    ///
    /// Always `false` unless [`Phase::Ready`]. An empty accessor is satisfied
    /// under `match_all` and unsatisfied otherwise.
    #[must_use]
    pub fn check<R: AsRef<str>>(&self, roles: &[R], accessor: &Accessor, match_all: bool) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }

        let mut requirements = accessor.requirements().iter();
        if match_all {
            requirements.all(|requirement| self.satisfies(roles, requirement))
        } else {
            requirements.any(|requirement| self.satisfies(roles, requirement))
        }
    }

    fn satisfies<R: AsRef<str>>(&self, roles: &[R], requirement: &str) -> bool {
        let has_role = |role: &str| roles.iter().any(|r| r.as_ref() == role);

        has_role(requirement)
            || self
                .groups
                .get(requirement)
                .is_some_and(|members| members.iter().any(|member| has_role(member.as_str())))
            || roles
                .iter()
                .filter_map(|role| self.permissions.get(role.as_ref()))
                .flatten()
                .any(|permission| grants(permission, requirement))
    }
}

/// Plain string-prefix wildcard: `product.*` also grants `product.edit.draft`
/// and `product*` grants `productivity`.
fn grants(permission: &str, requirement: &str) -> bool {
    permission == requirement
        || permission
            .strip_suffix('*')
            .is_some_and(|prefix| requirement.starts_with(prefix))
}

/// Resolves access checks against a configuration held in a state container.
///
/// Clones share the configuration.
#[derive(Clone, Debug)]
pub struct AccessControl {
    state: Container<AccessState>,
}

impl AccessControl {
    /// An unconfigured instance. Every check fails until
    /// [`configure`](Self::configure) completes.
    pub async fn new() -> Self {
        Self {
            state: Container::new(AccessState::default(), StoreOptions::in_memory()).await,
        }
    }

    /// Applies `config`.
    ///
    /// Checks fail while this runs. In remote mode the source is fetched and
    /// its groups and permissions replace local entries with the same key; a
    /// failed fetch is logged and the local part is applied alone. Concurrent
    /// calls are not ordered: the last one to finish wins.
    pub async fn configure(&self, config: AccessConfig) {
        self.state
            .update(|mut state| {
                state.phase = Phase::Configuring;
                state
            })
            .await;

        let AccessConfig {
            mode,
            mut groups,
            mut permissions,
            remote,
        } = config;

        if mode == AccessMode::Remote {
            match remote {
                Some(source) => match source.fetch().await {
                    Ok(fetched) => {
                        debug!(
                            "merging {} remote groups and {} remote roles",
                            fetched.groups.len(),
                            fetched.permissions.len()
                        );
                        groups.extend(fetched.groups);
                        permissions.extend(fetched.permissions);
                    }
                    Err(e) => warn!("using local access configuration only: {}", e),
                },
                None => warn!("remote access mode without a remote source"),
            }
        }

        info!(
            "access control ready ({} groups, {} roles with permissions)",
            groups.len(),
            permissions.len()
        );
        self.state
            .set(AccessState {
                phase: Phase::Ready,
                groups,
                permissions,
            })
            .await;
    }

    /// Whether configuration has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Ready
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.select(|state| state.phase)
    }

    /// Whether `roles` satisfy `accessor`: every requirement when
    /// `match_all`, any requirement otherwise.
    ///
    /// A requirement is satisfied by holding it as a role, by holding a role
    /// in the group it names, or by holding a role granted a matching
    /// permission.
    pub fn check<R: AsRef<str>>(
        &self,
        roles: &[R],
        accessor: impl Into<Accessor>,
        match_all: bool,
    ) -> bool {
        let accessor = accessor.into();
        self.state
            .select(|state| state.check(roles, &accessor, match_all))
    }

    /// Binds the roles of one user.
    pub fn for_roles<I, R>(&self, roles: I) -> UserAccess
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        UserAccess::new(self.clone(), roles.into_iter().map(Into::into).collect())
    }

    /// The container holding the resolved configuration, for subscribing to
    /// changes.
    #[must_use]
    pub const fn container(&self) -> &Container<AccessState> {
        &self.state
    }
}
