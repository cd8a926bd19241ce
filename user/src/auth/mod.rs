//! Authentication module for Inkpress
//!
//! - Session storage and cookie configuration with tower-sessions
//! - Binding sessions to user accounts
//! - Resolving a request's session into a [`authz::Principal`]
//! - Account types

pub mod resolver;
pub mod session;
pub mod store;
pub mod types;

pub use resolver::{SessionContext, SessionPrincipalResolver};
pub use session::{SessionKeys, SessionManager};
pub use store::{SameSiteConfig, SessionConfig, SqlxSessionStore};
pub use types::{validate_user_type, NewUser, UserProfile, UserRecord};
