use chrono::Utc;
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite, SqlitePool};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::auth::types::{validate_user_type, NewUser, UserRecord, UserRow};
use crate::error::{Result, UserError};
use authz::{Role, UserType};

/// Configuration for the user database
#[derive(Debug, Clone)]
pub struct UserDatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl Default for UserDatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/inkpress_users.db"),
            max_connections: 5,
            connection_timeout: 30,
        }
    }
}

impl UserDatabaseConfig {
    pub fn with_path(database_path: PathBuf) -> Self {
        Self {
            database_path,
            ..Self::default()
        }
    }
}

/// Identity database: user accounts and the session table
pub struct UserDatabase {
    pool: Pool<Sqlite>,
    config: UserDatabaseConfig,
}

impl UserDatabase {
    /// Initialize the user database
    pub async fn new(config: UserDatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_url = format!("sqlite:{}", config.database_path.display());

        if !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
            info!(
                "Creating user database at: {}",
                config.database_path.display()
            );
            Sqlite::create_database(&db_url).await.map_err(|e| {
                UserError::Initialization(format!("Failed to create database: {}", e))
            })?;
        }

        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&config.database_path)
                    .create_if_missing(true),
            )
            .await?;

        let db = Self { pool, config };
        db.run_migrations().await?;

        info!("User database initialized successfully");
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        info!("Running user database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                user_type TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                avatar TEXT,
                bio TEXT,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
            .execute(&self.pool)
            .await?;

        info!("User database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn config(&self) -> &UserDatabaseConfig {
        &self.config
    }

    /// Insert an account. The user type must belong to the role.
    pub async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let user_type = user.resolved_user_type();
        validate_user_type(user.role, user_type)?;

        if user.name.trim().is_empty() {
            return Err(UserError::Validation("name must not be empty".to_string()));
        }
        if !user.email.contains('@') {
            return Err(UserError::Validation(format!("invalid email: {}", user.email)));
        }
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(UserError::DuplicateEmail(user.email));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Ulid::new().to_string(),
            name: user.name,
            email: user.email,
            role: user.role,
            user_type,
            is_active: true,
            avatar: user.avatar,
            bio: user.bio,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO users (id, name, email, role, user_type, is_active, avatar, bio, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(record.role.as_str())
        .bind(record.user_type.as_str())
        .bind(record.is_active)
        .bind(&record.avatar)
        .bind(&record.bio)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Created {} account {}", record.role, record.id);
        Ok(record)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRecord::try_from).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRecord::try_from).transpose()
    }

    /// Load the subset of `ids` that exists
    pub async fn find_many(&self, ids: &[String]) -> Result<Vec<UserRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT * FROM users WHERE id IN ({})",
            vec!["?"; ids.len()].join(", ")
        );
        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(UserRecord::try_from)
            .collect()
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRecord>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(UserRecord::try_from)
            .collect()
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Change an account's role, validating the resulting pairing
    pub async fn update_role(&self, id: &str, role: Role, user_type: UserType) -> Result<()> {
        validate_user_type(role, user_type)?;

        let result = sqlx::query("UPDATE users SET role = ?, user_type = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(user_type.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound(id.to_string()));
        }
        debug!("Updated role of {} to {}/{}", id, role, user_type);
        Ok(())
    }

    pub async fn set_active_many(&self, ids: &[String], is_active: bool) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE users SET is_active = ?, updated_at = ? WHERE id IN ({})",
            vec!["?"; ids.len()].join(", ")
        );
        let mut query = sqlx::query(&sql).bind(is_active).bind(Utc::now());
        for id in ids {
            query = query.bind(id);
        }

        let updated = query.execute(&self.pool).await?.rows_affected();
        info!("Set is_active={} on {} accounts", is_active, updated);
        Ok(updated)
    }

    /// Verify the users table is present
    pub async fn verify_integrity(&self) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='users')",
        )
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            warn!("Missing table: users");
        }
        Ok(exists)
    }
}

/// Test helper: open an empty user database inside `dir`
#[cfg(test)]
pub(crate) async fn test_database(dir: &tempfile::TempDir) -> UserDatabase {
    UserDatabase::new(UserDatabaseConfig::with_path(dir.path().join("users.db")))
        .await
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("users.db");

        let db = UserDatabase::new(UserDatabaseConfig::with_path(db_path.clone()))
            .await
            .unwrap();

        assert!(db_path.exists());
        assert!(db.verify_integrity().await.unwrap());
        db.pool().close().await;
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_database(&temp_dir).await;

        let created = db
            .create_user(NewUser::new("Root", "root@example.com", Role::Admin).with_user_type(UserType::SuperAdmin))
            .await
            .unwrap();

        let fetched = db.get_user(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(authz::is_super_admin(&fetched.principal()));
    }

    #[tokio::test]
    async fn test_invalid_user_type_is_rejected_at_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_database(&temp_dir).await;

        let err = db
            .create_user(NewUser::new("Ann", "ann@example.com", Role::Author).with_user_type(UserType::SuperAdmin))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidUserType { .. }));

        let user = db
            .create_user(NewUser::new("Bo", "bo@example.com", Role::User))
            .await
            .unwrap();
        let err = db
            .update_role(&user.id, Role::Subscriber, UserType::Reader)
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidUserType { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_database(&temp_dir).await;

        db.create_user(NewUser::new("A", "same@example.com", Role::User))
            .await
            .unwrap();
        let err = db
            .create_user(NewUser::new("B", "same@example.com", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_find_many_and_deactivate() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_database(&temp_dir).await;

        let a = db.create_user(NewUser::new("A", "a@example.com", Role::User)).await.unwrap();
        let b = db.create_user(NewUser::new("B", "b@example.com", Role::Author)).await.unwrap();

        let found = db
            .find_many(&[a.id.clone(), b.id.clone(), Ulid::new().to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        assert_eq!(db.set_active_many(&[a.id.clone()], false).await.unwrap(), 1);
        let a = db.get_user(&a.id).await.unwrap().unwrap();
        assert!(!a.is_active);
        assert!(!a.principal().is_active);
        assert_eq!(db.count_users().await.unwrap(), 2);
    }
}
