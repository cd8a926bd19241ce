pub mod auth;
pub mod database;
pub mod error;

use std::sync::Arc;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::SqliteStore;
use tracing::info;

use authz::{Role, UserType};
use database::UserDatabase;

/// User management: identity store plus the session layer built on it
pub struct UserManager {
    database: Arc<UserDatabase>,
    session_store: SqlxSessionStore,
    session_config: SessionConfig,
}

impl UserManager {
    /// Open the identity store and its session table
    pub async fn new(
        db_config: database::UserDatabaseConfig,
        session_config: SessionConfig,
    ) -> error::Result<Self> {
        info!("Initializing user management system");

        let database = Arc::new(UserDatabase::new(db_config).await?);
        let session_store = SqlxSessionStore::new(database.pool().clone()).await?;

        info!("User management system initialized successfully");

        Ok(Self {
            database,
            session_store,
            session_config,
        })
    }

    /// Create a new user manager with default configuration
    pub async fn new_default() -> error::Result<Self> {
        Self::new(database::UserDatabaseConfig::default(), SessionConfig::new()?).await
    }

    pub fn database(&self) -> &UserDatabase {
        &self.database
    }

    /// Shared handle for consumers that outlive a borrow of the manager
    pub fn shared_database(&self) -> Arc<UserDatabase> {
        Arc::clone(&self.database)
    }

    pub fn session_store(&self) -> &SqlxSessionStore {
        &self.session_store
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }

    /// Session layer to mount on the router
    pub fn session_layer(&self) -> SessionManagerLayer<SqliteStore> {
        self.session_store.layer(&self.session_config)
    }

    /// Resolver the authorization gate uses for this store
    pub fn resolver(&self) -> SessionPrincipalResolver {
        SessionPrincipalResolver::new(Arc::clone(&self.database))
    }

    /// Create the super-admin account unless one with `email` already exists
    pub async fn ensure_super_admin(&self, name: &str, email: &str) -> error::Result<UserRecord> {
        if let Some(existing) = self.database.find_by_email(email).await? {
            return Ok(existing);
        }
        self.database
            .create_user(NewUser::new(name, email, Role::Admin).with_user_type(UserType::SuperAdmin))
            .await
    }

    pub async fn verify_integrity(&self) -> error::Result<bool> {
        self.database.verify_integrity().await
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> error::Result<()> {
        let removed = self.session_store.cleanup_expired().await?;
        info!("Cleaned up {} expired sessions", removed);
        Ok(())
    }
}

// Re-export commonly used types
pub use auth::{
    NewUser, SameSiteConfig, SessionConfig, SessionContext, SessionManager, SessionPrincipalResolver,
    SqlxSessionStore, UserProfile, UserRecord,
};
pub use database::UserDatabaseConfig;
pub use error::{Result as UserResult, UserError};
