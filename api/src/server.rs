use crate::{create_router, AppState};
use database::{seed, ConnectionManager};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use user::UserManager;

pub const DEFAULT_SUPER_ADMIN_NAME: &str = "Super Admin";
pub const DEFAULT_SUPER_ADMIN_EMAIL: &str = "superadmin@inkpress.local";

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Seed a super-admin and demo content before serving (development only)
    pub seed_demo_data: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            #[cfg(debug_assertions)]
            seed_demo_data: true,
            #[cfg(not(debug_assertions))]
            seed_demo_data: false,
        }
    }
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_demo_data(mut self, seed: bool) -> Self {
        self.seed_demo_data = seed;
        self
    }
}

/// Create the default super-admin and the demo content it owns.
///
/// Seeding connects the content store, so the first request no longer pays
/// for it.
pub async fn seed_demo_data(
    users: &UserManager,
    content: &ConnectionManager,
) -> Result<seed::SeedSummary, Box<dyn std::error::Error + Send + Sync>> {
    let admin = users
        .ensure_super_admin(DEFAULT_SUPER_ADMIN_NAME, DEFAULT_SUPER_ADMIN_EMAIL)
        .await?;
    let db = content.get().await?;
    Ok(seed::seed_demo_content(&db, &admin.id).await?)
}

/// Start the API server with the given configuration
pub async fn start_server_with_config(
    users: Arc<UserManager>,
    content: Arc<ConnectionManager>,
    config: ApiConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if config.seed_demo_data {
        info!("Seeding demo data for development");
        match seed_demo_data(&users, &content).await {
            Ok(summary) => info!(
                "Demo data ready: {} categories, {} posts, {} pages",
                summary.categories, summary.posts, summary.pages
            ),
            Err(e) => warn!("Failed to seed demo data: {}", e),
        }
    }

    let state = AppState::new(
        content,
        users.shared_database(),
        Arc::new(users.resolver()),
    );
    let app = create_router(state).layer(users.session_layer());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!("Swagger UI available at http://localhost:{}/api/v1/swagger", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Start the API server in a background task with custom configuration
pub fn spawn_server_with_config(
    users: Arc<UserManager>,
    content: Arc<ConnectionManager>,
    config: ApiConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server_with_config(users, content, config).await {
            tracing::error!("API server error: {}", e);
        }
    })
}
