pub mod health;
pub mod seed;
pub mod serve;

use clap::Args;
use std::path::PathBuf;

/// Locations of the two SQLite stores
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Content database (posts, pages, categories)
    #[arg(long, env = "INKPRESS_CONTENT_DB", default_value = "data/inkpress.db")]
    pub content_db: PathBuf,

    /// Identity database (users and sessions)
    #[arg(long, env = "INKPRESS_USER_DB", default_value = "data/inkpress_users.db")]
    pub user_db: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "INKPRESS_PORT", default_value_t = 3030)]
    pub port: u16,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Also write daily-rolling log files here
    #[arg(long, env = "INKPRESS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Seed the super admin and demo content before serving
    #[arg(long)]
    pub seed_demo_data: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Display name of the super admin account
    #[arg(long, default_value = api::server::DEFAULT_SUPER_ADMIN_NAME)]
    pub name: String,

    /// Email of the super admin account
    #[arg(long, default_value = api::server::DEFAULT_SUPER_ADMIN_EMAIL)]
    pub email: String,
}
