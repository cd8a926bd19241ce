//! Account types stored in the identity database

use authz::{Principal, Role, UserType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{Result, UserError};

/// Raw `users` row; role and user type are stored as their tokens
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub user_type: String,
    pub is_active: bool,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub user_type: UserType,
    pub is_active: bool,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            role: row.role.parse()?,
            user_type: row.user_type.parse()?,
            id: row.id,
            name: row.name,
            email: row.email,
            is_active: row.is_active,
            avatar: row.avatar,
            bio: row.bio,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl UserRecord {
    /// Build the per-request principal for this account
    pub fn principal(&self) -> Principal {
        Principal::new(self.id.clone(), self.role, self.user_type).with_active(self.is_active)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            bio: self.bio.clone(),
        }
    }
}

/// Public part of an account, safe to embed in content responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

/// Data for a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Defaults to the role's first user type
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
            user_type: None,
            avatar: None,
            bio: None,
        }
    }

    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.user_type = Some(user_type);
        self
    }

    pub fn resolved_user_type(&self) -> UserType {
        self.user_type.unwrap_or_else(|| self.role.default_user_type())
    }
}

/// Reject a role / user-type pairing outside the catalogue
pub fn validate_user_type(role: Role, user_type: UserType) -> Result<()> {
    if role.allows_user_type(user_type) {
        Ok(())
    } else {
        Err(UserError::InvalidUserType { role, user_type })
    }
}
