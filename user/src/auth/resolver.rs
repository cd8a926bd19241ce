//! Session resolution for the authorization gate.
//!
//! Turns the tower-sessions `Session` attached to a request into a fresh
//! [`Principal`] read from the user store. Nothing is cached between requests,
//! so a deactivation or role change applies to the very next request.

use async_trait::async_trait;
use authz::{AuthzError, SessionPayload, SessionResolver};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{debug, error};

use super::session::SessionManager;
use crate::database::UserDatabase;

/// The parts of a request the gate needs: the session (when the session
/// layer is mounted) and the headers.
#[derive(Clone, Default)]
pub struct SessionContext {
    pub session: Option<Session>,
    pub headers: HeaderMap,
}

impl SessionContext {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            session: parts.extensions.get::<Session>().cloned(),
            headers: parts.headers.clone(),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

pub struct SessionPrincipalResolver {
    db: Arc<UserDatabase>,
}

impl SessionPrincipalResolver {
    pub fn new(db: Arc<UserDatabase>) -> Self {
        Self { db }
    }

    /// Resolve directly from a session handle
    pub async fn resolve_session(&self, session: &Session) -> authz::Result<Option<SessionPayload>> {
        if session.id().is_none() {
            debug!("Request carries no session cookie");
            return Ok(None);
        }

        let user_id = SessionManager::user_id(session)
            .await
            .map_err(|e| resolution_error(e.to_string()))?;

        let Some(user_id) = user_id else {
            return Ok(Some(SessionPayload { user: None }));
        };

        let user = self
            .db
            .get_user(&user_id)
            .await
            .map_err(|e| resolution_error(e.to_string()))?;

        if user.is_none() {
            debug!("Session references a user that no longer exists");
        }

        Ok(Some(SessionPayload {
            user: user.map(|u| u.principal()),
        }))
    }
}

#[async_trait]
impl SessionResolver<SessionContext> for SessionPrincipalResolver {
    async fn resolve(&self, request: &SessionContext) -> authz::Result<Option<SessionPayload>> {
        match &request.session {
            Some(session) => self.resolve_session(session).await,
            None => Ok(None),
        }
    }
}

fn resolution_error(message: String) -> AuthzError {
    error!("Session resolution failed: {}", message);
    AuthzError::SessionResolution(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::NewUser;
    use crate::database::test_database;
    use authz::Role;
    use tempfile::TempDir;
    use tower_sessions::MemoryStore;

    fn parts_with(session: Option<Session>) -> SessionContext {
        let mut request = axum::http::Request::builder()
            .uri("/api/v1/auth/me")
            .body(())
            .unwrap();
        if let Some(session) = session {
            request.extensions_mut().insert(session);
        }
        SessionContext::from_parts(&request.into_parts().0)
    }

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_missing_session_layer_means_no_session() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = SessionPrincipalResolver::new(Arc::new(test_database(&temp_dir).await));

        assert_eq!(resolver.resolve(&parts_with(None)).await.unwrap(), None);
        assert_eq!(
            resolver.resolve(&parts_with(Some(new_session()))).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_session_principal_reflects_current_store_state() {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(test_database(&temp_dir).await);
        let resolver = SessionPrincipalResolver::new(db.clone());

        let user = db
            .create_user(NewUser::new("Writer", "w@example.com", Role::Author))
            .await
            .unwrap();
        let session = new_session();
        SessionManager::create_session(&session, &user).await.unwrap();

        let payload = resolver
            .resolve(&parts_with(Some(session.clone())))
            .await
            .unwrap()
            .unwrap();
        let principal = payload.user.unwrap();
        assert_eq!(principal.id, user.id);
        assert!(principal.is_active);

        db.set_active_many(&[user.id.clone()], false).await.unwrap();
        let payload = resolver
            .resolve(&parts_with(Some(session)))
            .await
            .unwrap()
            .unwrap();
        assert!(!payload.user.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_session_for_deleted_user_has_no_principal() {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(test_database(&temp_dir).await);
        let resolver = SessionPrincipalResolver::new(db.clone());

        let user = db
            .create_user(NewUser::new("Gone", "gone@example.com", Role::User))
            .await
            .unwrap();
        let session = new_session();
        SessionManager::create_session(&session, &user).await.unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&user.id)
            .execute(db.pool())
            .await
            .unwrap();

        let payload = resolver.resolve(&parts_with(Some(session))).await.unwrap();
        assert_eq!(payload, Some(SessionPayload { user: None }));
    }
}
