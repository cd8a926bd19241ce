//! Error types for the authorization core.
//!
//! # Security Note
//! Authorization *denials* are not errors. They are ordinary values
//! ([`crate::outcome::Denial`]) carrying a fixed status and message. The variants
//! here describe infrastructure failures and malformed tokens only, and their
//! messages are for logs, never for response bodies.

use thiserror::Error;

/// Errors that can occur inside the authorization core.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A role name did not match any member of the closed role set.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A user type name did not match any known sub-type.
    #[error("Unknown user type: {0}")]
    UnknownUserType(String),

    /// A permission token did not match any known token.
    #[error("Unknown permission token: {0}")]
    UnknownPermission(String),

    /// The external session resolver failed.
    ///
    /// Propagated to the caller unchanged; the gate never retries it.
    #[error("Session resolution failed: {0}")]
    SessionResolution(String),

    /// The storage connection could not be established.
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
