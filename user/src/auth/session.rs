//! Reading and writing the identity stored in a session

use tower_sessions::Session;
use tracing::debug;

use super::types::UserRecord;
use crate::error::{Result, UserError};

/// Session keys used for storing data
pub struct SessionKeys;

impl SessionKeys {
    pub const USER_ID: &'static str = "user_id";
    pub const CREATED_AT: &'static str = "created_at";
    pub const LAST_ACTIVITY: &'static str = "last_activity";
}

/// Session manager for handling user sessions
pub struct SessionManager;

impl SessionManager {
    /// Bind a session to `user`. Only the id is stored; role and status are
    /// read from the user store on every request.
    pub async fn create_session(session: &Session, user: &UserRecord) -> Result<()> {
        let now = chrono::Utc::now();

        // Rotate the id so a pre-login cookie cannot be reused
        session
            .cycle_id()
            .await
            .map_err(|e| UserError::Session(format!("Failed to cycle session id: {}", e)))?;

        session
            .insert(SessionKeys::USER_ID, &user.id)
            .await
            .map_err(|e| UserError::Session(format!("Failed to set user_id: {}", e)))?;

        session
            .insert(SessionKeys::CREATED_AT, now)
            .await
            .map_err(|e| UserError::Session(format!("Failed to set created_at: {}", e)))?;

        session
            .insert(SessionKeys::LAST_ACTIVITY, now)
            .await
            .map_err(|e| UserError::Session(format!("Failed to set last_activity: {}", e)))?;

        session
            .save()
            .await
            .map_err(|e| UserError::Session(format!("Failed to save session: {}", e)))?;

        debug!("Session created for user: {}", user.id);
        Ok(())
    }

    /// The user id bound to `session`, if any
    pub async fn user_id(session: &Session) -> Result<Option<String>> {
        session
            .get(SessionKeys::USER_ID)
            .await
            .map_err(|e| UserError::Session(format!("Failed to get user_id: {}", e)))
    }

    /// Update last activity timestamp
    pub async fn update_activity(session: &Session) -> Result<()> {
        session
            .insert(SessionKeys::LAST_ACTIVITY, chrono::Utc::now())
            .await
            .map_err(|e| UserError::Session(format!("Failed to update last_activity: {}", e)))
    }

    /// Destroy a session (logout)
    pub async fn destroy_session(session: &Session) -> Result<()> {
        session
            .flush()
            .await
            .map_err(|e| UserError::Session(format!("Failed to flush session: {}", e)))?;

        debug!("Session destroyed");
        Ok(())
    }

    pub async fn is_authenticated(session: &Session) -> bool {
        matches!(Self::user_id(session).await, Ok(Some(_)))
    }
}
