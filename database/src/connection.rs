//! Lazy, shared connection to the content database.
//!
//! The first caller opens the database; concurrent first callers wait on the
//! same attempt instead of racing to open their own pools. A failed attempt
//! leaves the cell empty so the next request tries again.

use async_trait::async_trait;
use authz::{AuthzError, StoreConnector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::init::{initialize_database, DatabaseConfig};
use crate::{Database, Result};

pub struct ConnectionManager {
    config: DatabaseConfig,
    cell: OnceCell<Arc<Database>>,
    attempts: AtomicUsize,
}

impl ConnectionManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Return the shared database, opening it on first use
    pub async fn get(&self) -> Result<Arc<Database>> {
        let db = self
            .cell
            .get_or_try_init(|| async {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                let db = initialize_database(&self.config).await.map_err(|e| {
                    error!("Content database connection failed: {}", e);
                    e
                })?;
                info!("Content database connected");
                Ok::<_, crate::DatabaseError>(Arc::new(db))
            })
            .await?;
        Ok(Arc::clone(db))
    }

    pub fn is_connected(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of times a connection has actually been opened
    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for ConnectionManager {
    async fn ensure_connected(&self) -> authz::Result<()> {
        self.get()
            .await
            .map(|_| ())
            .map_err(|e| AuthzError::StorageConnection(e.to_string()))
    }
}
