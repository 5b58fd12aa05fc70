//! Permission checks on top of a [`PermissionStore`].

use std::sync::Arc;
use tracing::debug;

use super::store::PermissionStore;
use crate::error::Result;

/// Prefix of permission members inside a role set.
pub const PERMISSION_PREFIX: &str = "perms:";

/// A user's role and the actions it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPermissions {
    pub user: String,
    pub role: String,
    /// Action names with the permission prefix stripped, sorted
    pub actions: Vec<String>,
}

/// Answers "may this user do this" by direct lookups: user to role, then
/// membership of `perms:<action>` in the role set. There is no caching and
/// no inheritance between roles.
pub struct Authorizer<S> {
    store: Arc<S>,
}

impl<S: PermissionStore> Authorizer<S> {
    /// Create an authorizer over a permission store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Whether `user` may perform `action`. Users without a role may do nothing.
    pub async fn has_permission(&self, user: &str, action: &str) -> Result<bool> {
        let Some(role) = self.store.user_role(user).await? else {
            debug!(user = %user, "User has no role");
            return Ok(false);
        };

        let permission = format!("{}{}", PERMISSION_PREFIX, action);
        let allowed = self.store.role_has_permission(&role, &permission).await?;
        debug!(user = %user, role = %role, action = %action, allowed = allowed, "Permission checked");
        Ok(allowed)
    }

    /// The role of `user` and its actions, or `None` if no role is assigned.
    pub async fn describe(&self, user: &str) -> Result<Option<UserPermissions>> {
        let Some(role) = self.store.user_role(user).await? else {
            return Ok(None);
        };

        let actions = self
            .store
            .role_permissions(&role)
            .await?
            .into_iter()
            .map(|p| {
                p.strip_prefix(PERMISSION_PREFIX)
                    .map(str::to_string)
                    .unwrap_or(p)
            })
            .collect();

        Ok(Some(UserPermissions {
            user: user.to_string(),
            role,
            actions,
        }))
    }

    /// The permission store behind this authorizer.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::MemoryPermissionStore;

    async fn sample_authorizer() -> Authorizer<MemoryPermissionStore> {
        let store = Arc::new(MemoryPermissionStore::new());
        store
            .grant("role:admin", &["perms:read", "perms:write", "perms:delete"])
            .await
            .unwrap();
        store
            .grant("role:editor", &["perms:read", "perms:write"])
            .await
            .unwrap();
        store.grant("role:viewer", &["perms:read"]).await.unwrap();

        store.assign_role("alice", "role:admin").await.unwrap();
        store.assign_role("bob", "role:editor").await.unwrap();
        store.assign_role("eve", "role:viewer").await.unwrap();

        Authorizer::new(store)
    }

    #[tokio::test]
    async fn test_sample_permissions() {
        let auth = sample_authorizer().await;

        assert!(auth.has_permission("alice", "delete").await.unwrap());
        assert!(!auth.has_permission("bob", "delete").await.unwrap());
        assert!(auth.has_permission("eve", "read").await.unwrap());
        assert!(!auth.has_permission("eve", "write").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_permissions() {
        let auth = sample_authorizer().await;

        assert!(!auth.has_permission("mallory", "read").await.unwrap());
        assert_eq!(auth.describe("mallory").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_role_upgrade() {
        let auth = sample_authorizer().await;
        assert!(!auth.has_permission("eve", "write").await.unwrap());

        auth.store().assign_role("eve", "role:editor").await.unwrap();

        assert!(auth.has_permission("eve", "write").await.unwrap());
        let described = auth.describe("eve").await.unwrap().unwrap();
        assert_eq!(described.role, "role:editor");
        assert_eq!(described.actions, vec!["read", "write"]);
    }

    #[tokio::test]
    async fn test_describe_strips_prefix() {
        let auth = sample_authorizer().await;

        let described = auth.describe("alice").await.unwrap().unwrap();
        assert_eq!(described.user, "alice");
        assert_eq!(described.role, "role:admin");
        assert_eq!(described.actions, vec!["delete", "read", "write"]);
    }

    #[tokio::test]
    async fn test_role_without_permissions() {
        let auth = sample_authorizer().await;
        auth.store().assign_role("trent", "role:ghost").await.unwrap();

        assert!(!auth.has_permission("trent", "read").await.unwrap());
        let described = auth.describe("trent").await.unwrap().unwrap();
        assert!(described.actions.is_empty());
    }

    #[tokio::test]
    async fn test_resource_owner() {
        let store = MemoryPermissionStore::new();
        store.set_resource_owner("doc1", "alice", 100.0).await.unwrap();

        assert_eq!(store.resource_owner_score("doc1", "alice"), Some(100.0));
        assert_eq!(store.resource_owner_score("doc1", "bob"), None);
    }
}
