//! Role-based permission checks.

mod authorizer;
mod store;

pub use authorizer::{Authorizer, UserPermissions, PERMISSION_PREFIX};
pub use store::{MemoryPermissionStore, PermissionStore, RedisPermissionStore};
