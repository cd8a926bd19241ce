//! Super-admin classification and the account-management rules built on it.

use crate::types::{Principal, Role, UserType};

/// True iff the principal is an admin whose sub-type is `superadmin`.
///
/// Ordinary admins (`user`, `editor`) are not super-admins.
pub fn is_super_admin(principal: &Principal) -> bool {
    principal.role == Role::Admin && principal.user_type == UserType::SuperAdmin
}

/// Whether `actor` may create an account with, or promote an account to, `role`.
///
/// Granting the admin role is reserved for super-admins.
pub fn may_assign_role(actor: &Principal, role: Role) -> bool {
    role != Role::Admin || is_super_admin(actor)
}

/// Whether `actor` may modify the account identified by `target_id` holding
/// `target_role`.
///
/// An admin account can only be changed by a super-admin or by its owner.
pub fn may_modify_account(actor: &Principal, target_id: &str, target_role: Role) -> bool {
    if target_role != Role::Admin {
        return true;
    }
    is_super_admin(actor) || actor.id == target_id
}
