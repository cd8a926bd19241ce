//! Demo content loaded into a fresh database.
//!
//! Everything seeded here carries `demo = true` and can only be changed by a
//! super-admin.

use tracing::info;

use crate::storage::{ContentKind, ContentStorage, NewContent};
use crate::{Database, Result};

/// Counts of seeded records
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub posts: usize,
    pub pages: usize,
}

fn demo_categories() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Engineering", "Notes from the people building the platform."),
        ("Announcements", "Release notes and product news."),
    ]
}

fn demo_posts() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Getting Started with Inkpress",
            "Create your first post from the dashboard. Lorem ipsum dolor sit amet, consectetur adipiscing elit.",
        ),
        (
            "Roles and Permissions",
            "Admins manage everything, authors manage their own writing. Sed do eiusmod tempor incididunt ut labore.",
        ),
        (
            "Working with Categories",
            "Categories group related posts. Ut enim ad minim veniam, quis nostrud exercitation ullamco.",
        ),
    ]
}

fn demo_pages() -> Vec<(&'static str, &'static str)> {
    vec![
        ("About", "Inkpress is a small content management system."),
        ("Contact", "Reach the editors at the address in the footer."),
    ]
}

/// Skip seeding when demo content is already present.
pub async fn is_seeded(db: &Database) -> Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE demo = 1",
        ContentKind::Category.table_name()
    );
    let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(db.pool()).await?;
    Ok(count > 0)
}

/// Insert demo categories, posts and pages authored by `author_id`
pub async fn seed_demo_content(db: &Database, author_id: &str) -> Result<SeedSummary> {
    if is_seeded(db).await? {
        info!("Demo content already present, skipping seed");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();

    let categories = ContentStorage::new(db, ContentKind::Category);
    let mut category_ids = Vec::new();
    for (title, body) in demo_categories() {
        let record = categories
            .create(author_id, demo(title, body, None))
            .await?;
        category_ids.push(record.id);
        summary.categories += 1;
    }

    let posts = ContentStorage::new(db, ContentKind::Post);
    for (idx, (title, body)) in demo_posts().into_iter().enumerate() {
        let category = category_ids.get(idx % category_ids.len().max(1)).cloned();
        posts.create(author_id, demo(title, body, category)).await?;
        summary.posts += 1;
    }

    let pages = ContentStorage::new(db, ContentKind::Page);
    for (title, body) in demo_pages() {
        pages.create(author_id, demo(title, body, None)).await?;
        summary.pages += 1;
    }

    info!(
        "Seeded {} categories, {} posts, {} pages",
        summary.categories, summary.posts, summary.pages
    );
    Ok(summary)
}

fn demo(title: &str, body: &str, category_id: Option<String>) -> NewContent {
    NewContent {
        title: title.to_string(),
        body: body.to_string(),
        category_id,
        demo: true,
    }
}
