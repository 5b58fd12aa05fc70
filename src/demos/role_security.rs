//! Role-based security demo.

use std::io::Write;
use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::security::{Authorizer, PermissionStore, RedisPermissionStore};
use crate::store::Store;

/// Roles and the permissions they grant.
const ROLES: [(&str, &[&str]); 3] = [
    ("role:admin", &["perms:read", "perms:write", "perms:delete"]),
    ("role:editor", &["perms:read", "perms:write"]),
    ("role:viewer", &["perms:read"]),
];

const USERS: [(&str, &str); 3] = [
    ("alice", "role:admin"),
    ("bob", "role:editor"),
    ("eve", "role:viewer"),
];

const RESOURCES: [(&str, &str, f64); 2] = [("doc1", "alice", 100.0), ("doc2", "bob", 200.0)];

/// Load the sample roles, users and resources.
pub async fn setup<S: PermissionStore>(store: &S) -> Result<()> {
    for (role, permissions) in ROLES {
        store.grant(role, permissions).await?;
    }
    for (user, role) in USERS {
        store.assign_role(user, role).await?;
    }
    for (resource, owner, score) in RESOURCES {
        store.set_resource_owner(resource, owner, score).await?;
    }
    Ok(())
}

/// Print the role of `user` and the actions it allows.
pub async fn print_user_permissions<S, W>(auth: &Authorizer<S>, user: &str, out: &mut W) -> Result<()>
where
    S: PermissionStore,
    W: Write,
{
    match auth.describe(user).await? {
        None => writeln!(out, "{} has no assigned role.", user)?,
        Some(described) => {
            writeln!(out, "{} has role {} with permissions:", user, described.role)?;
            for action in &described.actions {
                writeln!(out, " - {}", action)?;
            }
        }
    }
    Ok(())
}

/// Print whether `user` may perform `action`.
pub async fn attempt_action<S, W>(
    auth: &Authorizer<S>,
    user: &str,
    action: &str,
    out: &mut W,
) -> Result<bool>
where
    S: PermissionStore,
    W: Write,
{
    writeln!(out, "\nAttempting '{}' by {}...", action, user)?;
    let allowed = auth.has_permission(user, action).await?;
    if allowed {
        writeln!(out, "[PASS] {} is allowed to perform '{}'", user, action)?;
    } else {
        writeln!(out, "[FAIL] {} is NOT allowed to perform '{}'", user, action)?;
    }
    Ok(allowed)
}

/// The scripted sequence: report, attempt actions, upgrade eve, retry.
pub async fn script<S, W>(auth: &Authorizer<S>, out: &mut W) -> Result<Vec<bool>>
where
    S: PermissionStore,
    W: Write,
{
    setup(auth.store().as_ref()).await?;

    for (user, _) in USERS {
        print_user_permissions(auth, user, out).await?;
    }

    let mut outcomes = Vec::new();
    for (user, action) in [
        ("alice", "delete"),
        ("bob", "delete"),
        ("eve", "read"),
        ("eve", "write"),
    ] {
        outcomes.push(attempt_action(auth, user, action, out).await?);
    }

    writeln!(out, "\nUpgrading Eve to editor...")?;
    auth.store().assign_role("eve", "role:editor").await?;
    print_user_permissions(auth, "eve", out).await?;
    outcomes.push(attempt_action(auth, "eve", "write", out).await?);

    Ok(outcomes)
}

/// Run the demo against the store.
pub async fn run(store: Store) -> Result<()> {
    info!("Running role-based security demo");
    let auth = Authorizer::new(Arc::new(RedisPermissionStore::new(store)));
    script(&auth, &mut std::io::stdout()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::MemoryPermissionStore;

    #[tokio::test]
    async fn test_script_outcomes() {
        let auth = Authorizer::new(Arc::new(MemoryPermissionStore::new()));
        let mut out = Vec::new();

        let outcomes = script(&auth, &mut out).await.unwrap();
        assert_eq!(outcomes, vec![true, false, true, false, true]);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("alice has role role:admin with permissions:\n - delete\n - read\n - write\n"));
        assert!(text.contains("[FAIL] bob is NOT allowed to perform 'delete'"));
        assert!(text.contains("[PASS] eve is allowed to perform 'read'"));
        assert!(text.ends_with("[PASS] eve is allowed to perform 'write'\n"));
    }

    #[tokio::test]
    async fn test_setup_records_resource_owners() {
        let store = MemoryPermissionStore::new();
        setup(&store).await.unwrap();

        assert_eq!(store.resource_owner_score("doc1", "alice"), Some(100.0));
        assert_eq!(store.resource_owner_score("doc2", "bob"), Some(200.0));
    }

    #[tokio::test]
    async fn test_user_without_role() {
        let auth = Authorizer::new(Arc::new(MemoryPermissionStore::new()));
        let mut out = Vec::new();

        print_user_permissions(&auth, "nobody", &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "nobody has no assigned role.\n");
    }
}
