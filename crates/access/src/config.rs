use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::RemoteConfigSource;

/// Where the configuration comes from.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Only the groups and permissions given locally.
    #[default]
    Local,

    /// Local groups and permissions, overlaid with a remote fetch.
    Remote,
}

/// Groups and permissions to resolve checks against.
///
/// Deserializes from `{ "mode": "local" | "remote", "groups": {..},
/// "permissions": {..} }`. The remote source is set in code.
#[derive(Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// Where the configuration comes from.
    #[serde(default)]
    pub mode: AccessMode,

    /// Group name to member roles.
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,

    /// Role to granted permissions. A permission ending in `*` grants every
    /// requirement starting with what precedes the `*`.
    #[serde(default)]
    pub permissions: HashMap<String, Vec<String>>,

    /// Fetched during configuration in [`AccessMode::Remote`].
    #[serde(skip)]
    pub remote: Option<Arc<dyn RemoteConfigSource>>,
}

impl AccessConfig {
    /// An empty local configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group.
    #[must_use]
    pub fn group<I, R>(mut self, name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.groups
            .insert(name.into(), roles.into_iter().map(Into::into).collect());
        self
    }

    /// Grants permissions to a role.
    #[must_use]
    pub fn permissions<I, P>(mut self, role: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.permissions
            .insert(role.into(), permissions.into_iter().map(Into::into).collect());
        self
    }

    /// Switches to remote mode, fetching from `source`.
    #[must_use]
    pub fn remote(mut self, source: Arc<dyn RemoteConfigSource>) -> Self {
        self.mode = AccessMode::Remote;
        self.remote = Some(source);
        self
    }
}

impl Debug for AccessConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessConfig")
            .field("mode", &self.mode)
            .field("groups", &self.groups)
            .field("permissions", &self.permissions)
            .field("remote", &self.remote)
            .finish()
    }
}

/// The groups and permissions a remote source contributes. Entries replace
/// local entries with the same key.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct PartialAccessConfig {
    /// Group name to member roles.
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,

    /// Role to granted permissions.
    #[serde(default)]
    pub permissions: HashMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_deserialize() {
        let config: AccessConfig = serde_json::from_value(json!({
            "mode": "remote",
            "groups": { "staff": ["admin", "editor"] },
            "permissions": { "editor": ["product.edit"] }
        }))
        .unwrap();

        assert_eq!(config.mode, AccessMode::Remote);
        assert_eq!(config.groups["staff"], vec!["admin", "editor"]);
        assert_eq!(config.permissions["editor"], vec!["product.edit"]);
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_defaults() {
        let config: AccessConfig = serde_json::from_value(json!({})).unwrap();

        assert_eq!(config.mode, AccessMode::Local);
        assert!(config.groups.is_empty());
        assert!(config.permissions.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = AccessConfig::new()
            .group("staff", ["admin"])
            .permissions("admin", ["product.*"]);

        assert_eq!(config.groups["staff"], vec!["admin"]);
        assert_eq!(config.permissions["admin"], vec!["product.*"]);
    }
}
