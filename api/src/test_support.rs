//! Router fixtures for handler tests.
//!
//! Requests identify themselves with the `x-test-user` header instead of a
//! session cookie: no header means no session, `anonymous` means a session
//! without a user, anything else is a user id looked up in the identity store.

use async_trait::async_trait;
use authz::{Role, SessionPayload, SessionResolver, UserType};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use database::{ConnectionManager, ContentKind, ContentRecord, ContentStorage, DatabaseConfig, NewContent};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use user::{database::UserDatabase, NewUser, SessionContext, UserDatabaseConfig, UserRecord};

use crate::{create_router, AppState};

pub const TEST_USER_HEADER: &str = "x-test-user";

pub struct HeaderResolver {
    db: Arc<UserDatabase>,
}

#[async_trait]
impl SessionResolver<SessionContext> for HeaderResolver {
    async fn resolve(&self, request: &SessionContext) -> authz::Result<Option<SessionPayload>> {
        let Some(value) = request.headers.get(TEST_USER_HEADER) else {
            return Ok(None);
        };
        let id = value.to_str().unwrap_or_default();
        if id == "anonymous" {
            return Ok(Some(SessionPayload { user: None }));
        }
        let user = self
            .db
            .get_user(id)
            .await
            .map_err(|e| authz::AuthzError::SessionResolution(e.to_string()))?;
        Ok(Some(SessionPayload {
            user: user.map(|u| u.principal()),
        }))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub super_admin: UserRecord,
    pub admin: UserRecord,
    pub author: UserRecord,
    pub other_author: UserRecord,
    pub reader: UserRecord,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let users = Arc::new(
            UserDatabase::new(UserDatabaseConfig::with_path(dir.path().join("users.db")))
                .await
                .unwrap(),
        );
        let content = Arc::new(ConnectionManager::new(DatabaseConfig::new_with_path(
            dir.path().join("content.db"),
        )));

        let resolver = Arc::new(HeaderResolver { db: users.clone() });
        let state = AppState::new(content, users.clone(), resolver);

        let super_admin = users
            .create_user(
                NewUser::new("Root", "root@example.com", Role::Admin)
                    .with_user_type(UserType::SuperAdmin),
            )
            .await
            .unwrap();
        let admin = users
            .create_user(
                NewUser::new("Editor", "editor@example.com", Role::Admin)
                    .with_user_type(UserType::Editor),
            )
            .await
            .unwrap();
        let author = users
            .create_user(NewUser::new("Ada", "ada@example.com", Role::Author))
            .await
            .unwrap();
        let other_author = users
            .create_user(NewUser::new("Grace", "grace@example.com", Role::Author))
            .await
            .unwrap();
        let reader = users
            .create_user(NewUser::new("Rita", "rita@example.com", Role::User))
            .await
            .unwrap();

        Self {
            router: create_router(state.clone()),
            state,
            super_admin,
            admin,
            author,
            other_author,
            reader,
            _dir: dir,
        }
    }

    /// Insert content directly, bypassing the API
    pub async fn seed_content(
        &self,
        kind: ContentKind,
        owner: &UserRecord,
        title: &str,
        demo: bool,
    ) -> ContentRecord {
        let db = self.state.content.get().await.unwrap();
        ContentStorage::new(&db, kind)
            .create(
                &owner.id,
                NewContent {
                    title: title.to_string(),
                    body: "body".to_string(),
                    category_id: None,
                    demo,
                },
            )
            .await
            .unwrap()
    }

    pub async fn get_content(&self, kind: ContentKind, id: &str) -> Option<ContentRecord> {
        let db = self.state.content.get().await.unwrap();
        ContentStorage::new(&db, kind).get(id).await.unwrap()
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        as_user: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = as_user {
            builder = builder.header(TEST_USER_HEADER, user);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }
}
