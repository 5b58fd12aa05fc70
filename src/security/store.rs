//! Role and permission storage.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::AsyncCommands;

use crate::error::Result;
use crate::store::Store;

/// Storage for user-to-role assignments, role permission sets and resource owners.
///
/// Roles and permissions are passed around as full keys (`role:admin`,
/// `perms:read`), the way they are stored.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Point `user` at `role`, replacing any previous assignment.
    async fn assign_role(&self, user: &str, role: &str) -> Result<()>;

    /// Add permissions to `role`.
    async fn grant(&self, role: &str, permissions: &[&str]) -> Result<()>;

    /// Record `owner` of `resource` with the given score.
    async fn set_resource_owner(&self, resource: &str, owner: &str, score: f64) -> Result<()>;

    /// The role assigned to `user`, if any.
    async fn user_role(&self, user: &str) -> Result<Option<String>>;

    /// All permissions granted to `role`, sorted.
    async fn role_permissions(&self, role: &str) -> Result<Vec<String>>;

    /// Whether `role` holds `permission`.
    async fn role_has_permission(&self, role: &str, permission: &str) -> Result<bool>;
}

fn user_key(user: &str) -> String {
    format!("user:{}", user)
}

fn resource_key(resource: &str) -> String {
    format!("resource:{}", resource)
}

fn owner_member(owner: &str) -> String {
    format!("owner:{}", owner)
}

/// Permissions kept in the external store: `user:<name>` strings hold role
/// keys, role keys are sets of permission keys, `resource:<name>` are sorted
/// sets of `owner:<user>` members.
pub struct RedisPermissionStore {
    store: Store,
}

impl RedisPermissionStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionStore for RedisPermissionStore {
    async fn assign_role(&self, user: &str, role: &str) -> Result<()> {
        let mut conn = self.store.connection();
        let _: () = conn.set(user_key(user), role).await?;
        Ok(())
    }

    async fn grant(&self, role: &str, permissions: &[&str]) -> Result<()> {
        let mut conn = self.store.connection();
        let _: () = conn.sadd(role, permissions).await?;
        Ok(())
    }

    async fn set_resource_owner(&self, resource: &str, owner: &str, score: f64) -> Result<()> {
        let mut conn = self.store.connection();
        let _: () = conn
            .zadd(resource_key(resource), owner_member(owner), score)
            .await?;
        Ok(())
    }

    async fn user_role(&self, user: &str) -> Result<Option<String>> {
        let mut conn = self.store.connection();
        let role: Option<String> = conn.get(user_key(user)).await?;
        Ok(role.filter(|r| !r.is_empty()))
    }

    async fn role_permissions(&self, role: &str) -> Result<Vec<String>> {
        let mut conn = self.store.connection();
        let mut permissions: Vec<String> = conn.smembers(role).await?;
        permissions.sort();
        Ok(permissions)
    }

    async fn role_has_permission(&self, role: &str, permission: &str) -> Result<bool> {
        let mut conn = self.store.connection();
        Ok(conn.sismember(role, permission).await?)
    }
}

/// In-memory [`PermissionStore`].
#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    strings: RwLock<HashMap<String, String>>,
    sets: RwLock<HashMap<String, BTreeSet<String>>>,
    owners: RwLock<HashMap<String, HashMap<String, f64>>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score recorded for `owner` of `resource`.
    pub fn resource_owner_score(&self, resource: &str, owner: &str) -> Option<f64> {
        self.owners
            .read()
            .get(&resource_key(resource))
            .and_then(|members| members.get(&owner_member(owner)).copied())
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn assign_role(&self, user: &str, role: &str) -> Result<()> {
        self.strings.write().insert(user_key(user), role.to_string());
        Ok(())
    }

    async fn grant(&self, role: &str, permissions: &[&str]) -> Result<()> {
        self.sets
            .write()
            .entry(role.to_string())
            .or_default()
            .extend(permissions.iter().map(|p| p.to_string()));
        Ok(())
    }

    async fn set_resource_owner(&self, resource: &str, owner: &str, score: f64) -> Result<()> {
        self.owners
            .write()
            .entry(resource_key(resource))
            .or_default()
            .insert(owner_member(owner), score);
        Ok(())
    }

    async fn user_role(&self, user: &str) -> Result<Option<String>> {
        Ok(self
            .strings
            .read()
            .get(&user_key(user))
            .filter(|r| !r.is_empty())
            .cloned())
    }

    async fn role_permissions(&self, role: &str) -> Result<Vec<String>> {
        Ok(self
            .sets
            .read()
            .get(role)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn role_has_permission(&self, role: &str, permission: &str) -> Result<bool> {
        Ok(self
            .sets
            .read()
            .get(role)
            .map(|set| set.contains(permission))
            .unwrap_or(false))
    }
}
