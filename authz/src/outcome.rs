//! The result of a gate invocation.
//!
//! A gate call yields exactly one of [`AuthOutcome::Authorized`] or
//! [`AuthOutcome::Denied`]. Callers branch on the variant, never on field
//! presence.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Principal;

pub const SESSION_NOT_FOUND: &str = "Session not Found";
pub const NOT_AUTHENTICATED: &str = "User not Authenticated";
pub const ACCOUNT_INACTIVE: &str = "User not Allowed To Perform Any Actions!";
pub const ROLE_NOT_ALLOWED: &str = "User not Allowed To Perform This Action!";
pub const ACCESS_DENIED: &str = "Access Denied";
pub const ID_REQUIRED: &str = "ID is required";
pub const INVALID_ID: &str = "Invalid ID";
pub const INVALID_IDS: &str = "Invalid ID(s)";
pub const RESOURCE_NOT_FOUND: &str = "Resource not found";
pub const DEMO_PROTECTED: &str = "Demo data can only be modified by a super admin!";
pub const NOT_OWNER: &str = "You can only modify resources you created!";
pub const ADMIN_ROLE_RESTRICTED: &str = "Only a super admin can assign the admin role!";
pub const ADMIN_ACCOUNT_PROTECTED: &str = "Only a super admin can modify other admin accounts!";

/// A structured refusal: an HTTP status and a fixed, non-revealing message.
///
/// Serializes as `{"status": 403, "error": "Access Denied"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    pub status: u16,
    pub error: String,
}

impl Denial {
    pub fn new(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn session_not_found() -> Self {
        Self::new(403, SESSION_NOT_FOUND)
    }

    pub fn not_authenticated() -> Self {
        Self::new(401, NOT_AUTHENTICATED)
    }

    pub fn account_inactive() -> Self {
        Self::new(401, ACCOUNT_INACTIVE)
    }

    pub fn role_not_allowed() -> Self {
        Self::new(403, ROLE_NOT_ALLOWED)
    }

    pub fn access_denied() -> Self {
        Self::new(403, ACCESS_DENIED)
    }

    pub fn id_required() -> Self {
        Self::new(400, ID_REQUIRED)
    }

    pub fn invalid_id() -> Self {
        Self::new(400, INVALID_ID)
    }

    pub fn invalid_ids() -> Self {
        Self::new(400, INVALID_IDS)
    }

    pub fn not_found() -> Self {
        Self::new(404, RESOURCE_NOT_FOUND)
    }

    pub fn demo_protected() -> Self {
        Self::new(403, DEMO_PROTECTED)
    }

    pub fn not_owner() -> Self {
        Self::new(403, NOT_OWNER)
    }

    pub fn admin_role_restricted() -> Self {
        Self::new(403, ADMIN_ROLE_RESTRICTED)
    }

    pub fn admin_account_protected() -> Self {
        Self::new(403, ADMIN_ACCOUNT_PROTECTED)
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.error)
    }
}

/// Either an authenticated principal or a terminal denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized(Principal),
    Denied(Denial),
}

impl AuthOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthOutcome::Authorized(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthOutcome::Authorized(principal) => Some(principal),
            AuthOutcome::Denied(_) => None,
        }
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            AuthOutcome::Authorized(_) => None,
            AuthOutcome::Denied(denial) => Some(denial),
        }
    }

    /// Converts into a `Result` so callers can use `?`.
    pub fn into_result(self) -> Result<Principal, Denial> {
        match self {
            AuthOutcome::Authorized(principal) => Ok(principal),
            AuthOutcome::Denied(denial) => Err(denial),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, UserType};

    #[test]
    fn test_denial_serializes_flat() {
        let value = serde_json::to_value(Denial::access_denied()).unwrap();
        assert_eq!(value, serde_json::json!({ "status": 403, "error": "Access Denied" }));
    }

    #[test]
    fn test_canonical_statuses() {
        assert_eq!(Denial::session_not_found().status, 403);
        assert_eq!(Denial::not_authenticated().status, 401);
        assert_eq!(Denial::account_inactive().status, 401);
        assert_eq!(Denial::role_not_allowed().status, 403);
        assert_eq!(Denial::id_required().status, 400);
        assert_eq!(Denial::invalid_ids().error, "Invalid ID(s)");
    }

    #[test]
    fn test_outcome_accessors() {
        let principal = Principal::new("p", Role::User, UserType::Reader);
        let allowed = AuthOutcome::Authorized(principal.clone());
        assert!(allowed.is_authorized());
        assert_eq!(allowed.principal(), Some(&principal));
        assert!(allowed.denial().is_none());
        assert_eq!(allowed.into_result(), Ok(principal));

        let denied = AuthOutcome::Denied(Denial::access_denied());
        assert!(!denied.is_authorized());
        assert_eq!(denied.into_result(), Err(Denial::access_denied()));
    }
}
