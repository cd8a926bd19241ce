use super::SeedArgs;
use anyhow::Result;
use colored::*;
use database::{initialize_database, seed, DatabaseConfig};
use user::{SessionConfig, UserDatabaseConfig, UserManager};

/// Execute the seed command
pub async fn execute(args: SeedArgs) -> Result<()> {
    let users = UserManager::new(
        UserDatabaseConfig::with_path(args.store.user_db.clone()),
        SessionConfig::default(),
    )
    .await?;
    let admin = users.ensure_super_admin(&args.name, &args.email).await?;
    println!(
        "{} {} <{}> ({})",
        "Super admin:".bold(),
        admin.name,
        admin.email,
        admin.id
    );

    let config = DatabaseConfig::new_with_path(args.store.content_db.clone());
    let db = initialize_database(&config).await?;
    let summary = seed::seed_demo_content(&db, &admin.id).await?;

    if summary.categories + summary.posts + summary.pages == 0 {
        println!("{}", "Demo content already present, nothing to do".yellow());
    } else {
        println!(
            "{} {} categories, {} posts, {} pages",
            "Demo content created:".green().bold(),
            summary.categories,
            summary.posts,
            summary.pages
        );
    }

    Ok(())
}
