//! Role → permission table and the permission check built on it.
//!
//! The table is built once, on first use, and is read-only afterwards. There
//! is no mutation API. Every role has an entry (possibly empty), so a lookup
//! is a plain set-membership test and an unmapped pair is simply denied.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;
use crate::types::{Principal, Role};

/// A capability token checked against a role's granted set.
///
/// Serialized as its canonical upper-snake-case token, e.g. `"VIEW_USERS"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ViewDashboard,
    ViewUsers,
    ManageUsers,
    DeleteUsers,
    ViewPosts,
    ManagePosts,
    PublishPosts,
    DeletePosts,
    ViewPages,
    ManagePages,
    PublishPages,
    DeletePages,
    ViewCategories,
    ManageCategories,
    DeleteCategories,
}

impl Permission {
    pub const ALL: [Permission; 15] = [
        Permission::ViewDashboard,
        Permission::ViewUsers,
        Permission::ManageUsers,
        Permission::DeleteUsers,
        Permission::ViewPosts,
        Permission::ManagePosts,
        Permission::PublishPosts,
        Permission::DeletePosts,
        Permission::ViewPages,
        Permission::ManagePages,
        Permission::PublishPages,
        Permission::DeletePages,
        Permission::ViewCategories,
        Permission::ManageCategories,
        Permission::DeleteCategories,
    ];

    /// The canonical token string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewDashboard => "VIEW_DASHBOARD",
            Permission::ViewUsers => "VIEW_USERS",
            Permission::ManageUsers => "MANAGE_USERS",
            Permission::DeleteUsers => "DELETE_USERS",
            Permission::ViewPosts => "VIEW_POSTS",
            Permission::ManagePosts => "MANAGE_POSTS",
            Permission::PublishPosts => "PUBLISH_POSTS",
            Permission::DeletePosts => "DELETE_POSTS",
            Permission::ViewPages => "VIEW_PAGES",
            Permission::ManagePages => "MANAGE_PAGES",
            Permission::PublishPages => "PUBLISH_PAGES",
            Permission::DeletePages => "DELETE_PAGES",
            Permission::ViewCategories => "VIEW_CATEGORIES",
            Permission::ManageCategories => "MANAGE_CATEGORIES",
            Permission::DeleteCategories => "DELETE_CATEGORIES",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AuthzError::UnknownPermission(s.to_string()))
    }
}

static PERMISSION_TABLE: Lazy<HashMap<Role, HashSet<Permission>>> = Lazy::new(|| {
    use Permission::*;

    let mut table = HashMap::new();
    table.insert(Role::Admin, Permission::ALL.into_iter().collect());
    table.insert(
        Role::Author,
        [
            ViewDashboard,
            ViewPosts,
            ManagePosts,
            PublishPosts,
            DeletePosts,
            ViewPages,
            ManagePages,
            ViewCategories,
            ManageCategories,
        ]
        .into_iter()
        .collect(),
    );
    table.insert(
        Role::User,
        [ViewDashboard, ViewPosts, ViewPages, ViewCategories]
            .into_iter()
            .collect(),
    );
    table.insert(Role::Subscriber, HashSet::new());
    table
});

/// The permissions granted to `role`.
pub fn permissions_for(role: Role) -> impl Iterator<Item = Permission> {
    PERMISSION_TABLE
        .get(&role)
        .into_iter()
        .flat_map(|set| set.iter().copied())
}

/// Returns true iff the table lists `permission` under `role`.
///
/// `permission` may be any string; tokens that are not part of the known set
/// are denied.
pub fn has_permission(role: Role, permission: &str) -> bool {
    match permission.parse::<Permission>() {
        Ok(permission) => role_grants(role, permission),
        Err(_) => false,
    }
}

/// Same as [`has_permission`] but for a role name that has not been parsed yet.
pub fn has_permission_by_name(role: &str, permission: &str) -> bool {
    role.parse::<Role>()
        .map(|role| has_permission(role, permission))
        .unwrap_or(false)
}

/// Typed variant used throughout the workspace.
pub fn role_grants(role: Role, permission: Permission) -> bool {
    PERMISSION_TABLE
        .get(&role)
        .is_some_and(|granted| granted.contains(&permission))
}

/// `has_permission(principal.role, permission)`.
pub fn user_can(principal: &Principal, permission: Permission) -> bool {
    role_grants(principal.role, permission)
}
