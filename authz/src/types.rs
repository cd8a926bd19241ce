//! Core identity types for the authorization core.
//!
//! # Security Considerations
//!
//! ## Principal Identity
//! - A [`Principal`] is built fresh for every request from the session lookup
//!   and is never cached across requests
//! - It is immutable for the duration of one request; nothing in this crate
//!   hands out a mutable reference to it
//!
//! ## Role and Sub-type
//! - [`Role`] is a closed set; an unknown role string never parses, so it can
//!   never be granted anything
//! - [`UserType`] legality depends on the role (see [`Role::user_types`]). The
//!   pairing is enforced by the user store at persistence time, not here
//!
//! ## Account Status
//! - An inactive principal is refused by the gate before any role or
//!   permission check runs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;

/// The closed set of roles a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Author,
    User,
    Subscriber,
}

impl Role {
    /// Every role, in descending order of privilege.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Author, Role::User, Role::Subscriber];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Author => "author",
            Role::User => "user",
            Role::Subscriber => "subscriber",
        }
    }

    /// The sub-types that may be stored alongside this role.
    pub fn user_types(&self) -> &'static [UserType] {
        match self {
            Role::Admin => &[UserType::User, UserType::Editor, UserType::SuperAdmin],
            Role::Author => &[
                UserType::Teacher,
                UserType::Programmer,
                UserType::Engineer,
                UserType::Writer,
                UserType::Researcher,
            ],
            Role::User => &[
                UserType::Student,
                UserType::Commentator,
                UserType::Reader,
                UserType::Learner,
            ],
            Role::Subscriber => &[UserType::User],
        }
    }

    /// The sub-type assigned when an account is created without one.
    pub fn default_user_type(&self) -> UserType {
        self.user_types()[0]
    }

    pub fn allows_user_type(&self, user_type: UserType) -> bool {
        self.user_types().contains(&user_type)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "author" => Ok(Role::Author),
            "user" => Ok(Role::User),
            "subscriber" => Ok(Role::Subscriber),
            other => Err(AuthzError::UnknownRole(other.to_string())),
        }
    }
}

/// Finer-grained classification of a principal within its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    User,
    Editor,
    SuperAdmin,
    Teacher,
    Programmer,
    Engineer,
    Writer,
    Researcher,
    Student,
    Commentator,
    Reader,
    Learner,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::User => "user",
            UserType::Editor => "editor",
            UserType::SuperAdmin => "superadmin",
            UserType::Teacher => "teacher",
            UserType::Programmer => "programmer",
            UserType::Engineer => "engineer",
            UserType::Writer => "writer",
            UserType::Researcher => "researcher",
            UserType::Student => "student",
            UserType::Commentator => "commentator",
            UserType::Reader => "reader",
            UserType::Learner => "learner",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let user_type = match s {
            "user" => UserType::User,
            "editor" => UserType::Editor,
            "superadmin" => UserType::SuperAdmin,
            "teacher" => UserType::Teacher,
            "programmer" => UserType::Programmer,
            "engineer" => UserType::Engineer,
            "writer" => UserType::Writer,
            "researcher" => UserType::Researcher,
            "student" => UserType::Student,
            "commentator" => UserType::Commentator,
            "reader" => UserType::Reader,
            "learner" => UserType::Learner,
            other => return Err(AuthzError::UnknownUserType(other.to_string())),
        };
        Ok(user_type)
    }
}

/// The authenticated actor making a request.
///
/// # Security Note
/// Principals must only ever be derived from an authenticated session. Never
/// build one from request body or query data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier of the account (a ULID)
    pub id: String,

    pub role: Role,

    pub user_type: UserType,

    /// Inactive principals are refused for every protected action
    pub is_active: bool,
}

impl Principal {
    /// Creates an active principal with the given role and sub-type.
    pub fn new(id: impl Into<String>, role: Role, user_type: UserType) -> Self {
        Self {
            id: id.into(),
            role,
            user_type,
            is_active: true,
        }
    }

    /// Returns the same principal with its active flag replaced.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_types_per_role() {
        assert!(Role::Admin.allows_user_type(UserType::SuperAdmin));
        assert!(Role::Admin.allows_user_type(UserType::Editor));
        assert!(!Role::Author.allows_user_type(UserType::SuperAdmin));
        assert!(Role::Subscriber.allows_user_type(UserType::User));
        assert!(!Role::Subscriber.allows_user_type(UserType::Reader));
        assert_eq!(Role::User.default_user_type(), UserType::Student);
    }

    #[test]
    fn test_principal_serializes_lowercase_tokens() {
        let principal = Principal::new("01H8XGJWBWBAQ4Z4M9D5K4Z3E1", Role::Admin, UserType::SuperAdmin);
        let value = serde_json::to_value(&principal).unwrap();
        assert_eq!(value["role"], "admin");
        assert_eq!(value["user_type"], "superadmin");
        assert_eq!(value["is_active"], true);
    }

    #[test]
    fn test_with_active() {
        let principal = Principal::new("p", Role::User, UserType::Reader).with_active(false);
        assert!(!principal.is_active);
        assert!(!principal.is_admin());
    }
}
