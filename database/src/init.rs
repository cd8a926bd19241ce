use crate::storage::ContentKind;
use crate::{Database, Result};
use std::path::PathBuf;
use tracing::info;

/// Database initialization configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Whether to create tables on initialization
    pub create_tables: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data").join("inkpress.db"),
            create_tables: true,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration with default paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new database configuration with a specific database path
    pub fn new_with_path(database_path: PathBuf) -> Self {
        Self {
            database_path,
            create_tables: true,
        }
    }

    /// Set a custom database path
    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = path;
        self
    }

    /// Set whether to create tables on initialization
    pub fn with_create_tables(mut self, create: bool) -> Self {
        self.create_tables = create;
        self
    }
}

/// Open the database described by `config`, creating content tables if asked
pub async fn initialize_database(config: &DatabaseConfig) -> Result<Database> {
    info!("Initializing database at {:?}", config.database_path);

    let db = Database::new(&config.database_path).await?;

    if config.create_tables {
        create_content_tables(&db).await?;
    }

    Ok(db)
}

/// Create one table per content kind
pub async fn create_content_tables(db: &Database) -> Result<()> {
    for kind in ContentKind::ALL {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',
                author_or_added_by TEXT NOT NULL,
                category_id TEXT,
                demo BOOLEAN NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
            kind.table_name()
        );
        db.execute_raw(&sql).await?;
        info!("Created table {}", kind.table_name());
    }

    Ok(())
}
