use super::ServeArgs;
use anyhow::{anyhow, Result};
use api::ApiConfig;
use database::{ConnectionManager, DatabaseConfig};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use user::{SessionConfig, UserDatabaseConfig, UserManager};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Open the identity store eagerly, leave the content store to connect on
/// first use, and serve until the listener fails.
pub async fn execute(args: ServeArgs) -> Result<()> {
    info!("=== Inkpress CMS starting ===");

    let users = Arc::new(
        UserManager::new(
            UserDatabaseConfig::with_path(args.store.user_db.clone()),
            SessionConfig::new()?,
        )
        .await?,
    );

    let content = Arc::new(ConnectionManager::new(DatabaseConfig::new_with_path(
        args.store.content_db.clone(),
    )));
    info!(
        "Content store at {} will connect on first use",
        args.store.content_db.display()
    );

    let cleanup_users = Arc::clone(&users);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = cleanup_users.cleanup_expired().await {
                warn!("Session cleanup failed: {}", e);
            }
        }
    });

    let config = ApiConfig::new()
        .with_port(args.port)
        .with_demo_data(args.seed_demo_data);

    api::start_server_with_config(users, content, config)
        .await
        .map_err(|e| anyhow!(e))
}
