use authz::{Role, UserType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authorization model error: {0}")]
    Authz(#[from] authz::AuthzError),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User type '{user_type}' is not valid for role '{role}'")]
    InvalidUserType { role: Role, user_type: UserType },

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Initialization error: {0}")]
    Initialization(String),
}

pub type Result<T> = std::result::Result<T, UserError>;
