//! SQLx session store and cookie configuration for tower-sessions

use std::env;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::{debug, error, info, warn};

use crate::error::{Result, UserError};

/// SQLx-based session store for tower-sessions
#[derive(Debug, Clone)]
pub struct SqlxSessionStore {
    store: SqliteStore,
    pool: SqlitePool,
}

impl SqlxSessionStore {
    /// Create the store, creating its table if needed
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let store = SqliteStore::new(pool.clone());
        store.migrate().await.map_err(|e| {
            error!("Failed to create session table: {}", e);
            UserError::Database(e)
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tower_sessions_expiry ON tower_sessions(expiry_date)",
        )
        .execute(&pool)
        .await?;

        info!("SQLx session store initialized");
        Ok(Self { store, pool })
    }

    /// Get the underlying SqliteStore
    pub fn inner(&self) -> &SqliteStore {
        &self.store
    }

    /// Build the session layer for the HTTP router
    pub fn layer(&self, config: &SessionConfig) -> SessionManagerLayer<SqliteStore> {
        SessionManagerLayer::new(self.store.clone())
            .with_name(config.cookie_name.clone())
            .with_secure(config.secure)
            .with_http_only(config.http_only)
            .with_same_site(config.same_site.into())
            .with_expiry(Expiry::OnInactivity(Duration::seconds(config.timeout_seconds)))
    }

    /// Delete expired sessions, returning how many were removed
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();

        let removed = sqlx::query("DELETE FROM tower_sessions WHERE expiry_date < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to cleanup expired sessions: {}", e);
                UserError::Session(format!("Session cleanup failed: {}", e))
            })?
            .rows_affected();

        debug!("Removed {} expired sessions", removed);
        Ok(removed)
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie name
    pub cookie_name: String,
    /// Inactivity timeout in seconds
    pub timeout_seconds: i64,
    /// Whether to use secure cookies (HTTPS only)
    pub secure: bool,
    /// SameSite cookie attribute
    pub same_site: SameSiteConfig,
    /// HTTP only cookie (not accessible via JavaScript)
    pub http_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "inkpress_session".to_string(),
            timeout_seconds: 86400,
            secure: false,
            same_site: SameSiteConfig::Lax,
            http_only: true,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `SESSION_TIMEOUT_SECONDS` and `SESSION_SECURE_COOKIE`
    pub fn new() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("SESSION_TIMEOUT_SECONDS") {
            config.timeout_seconds = raw.parse().map_err(|_| {
                UserError::Configuration(format!("Invalid SESSION_TIMEOUT_SECONDS: {}", raw))
            })?;
            if config.timeout_seconds <= 0 {
                return Err(UserError::Configuration(
                    "SESSION_TIMEOUT_SECONDS must be positive".to_string(),
                ));
            }
        }

        if let Ok(raw) = env::var("SESSION_SECURE_COOKIE") {
            config.secure = match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    warn!("Ignoring unrecognised SESSION_SECURE_COOKIE value: {}", raw);
                    config.secure
                }
            };
        }

        Ok(config)
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: i64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// SameSite cookie configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SameSiteConfig {
    Strict,
    Lax,
    None,
}

impl From<SameSiteConfig> for tower_sessions::cookie::SameSite {
    fn from(config: SameSiteConfig) -> Self {
        match config {
            SameSiteConfig::Strict => tower_sessions::cookie::SameSite::Strict,
            SameSiteConfig::Lax => tower_sessions::cookie::SameSite::Lax,
            SameSiteConfig::None => tower_sessions::cookie::SameSite::None,
        }
    }
}
