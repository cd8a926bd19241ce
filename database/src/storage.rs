use crate::{Database, DatabaseError, Result};
use authz::{OwnedResource, OwnershipBypass, Permission};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use ulid::Ulid;

/// The kinds of content the CMS stores, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Page,
    Category,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Post, ContentKind::Page, ContentKind::Category];

    pub fn table_name(&self) -> &'static str {
        match self {
            ContentKind::Post => "content_post",
            ContentKind::Page => "content_page",
            ContentKind::Category => "content_category",
        }
    }

    /// Plural path segment, e.g. `/content/posts`
    pub fn path_segment(&self) -> &'static str {
        match self {
            ContentKind::Post => "posts",
            ContentKind::Page => "pages",
            ContentKind::Category => "categories",
        }
    }

    pub fn view_permission(&self) -> Permission {
        match self {
            ContentKind::Post => Permission::ViewPosts,
            ContentKind::Page => Permission::ViewPages,
            ContentKind::Category => Permission::ViewCategories,
        }
    }

    pub fn manage_permission(&self) -> Permission {
        match self {
            ContentKind::Post => Permission::ManagePosts,
            ContentKind::Page => Permission::ManagePages,
            ContentKind::Category => Permission::ManageCategories,
        }
    }

    pub fn delete_permission(&self) -> Permission {
        match self {
            ContentKind::Post => Permission::DeletePosts,
            ContentKind::Page => Permission::DeletePages,
            ContentKind::Category => Permission::DeleteCategories,
        }
    }

    /// Any admin may change another admin's categories. Posts and pages need a
    /// super-admin to act on someone else's record.
    pub fn ownership_bypass(&self) -> OwnershipBypass {
        match self {
            ContentKind::Category => OwnershipBypass::AnyAdmin,
            ContentKind::Post | ContentKind::Page => OwnershipBypass::SuperAdminOnly,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for ContentKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "posts" | "post" => Ok(ContentKind::Post),
            "pages" | "page" => Ok(ContentKind::Page),
            "categories" | "category" => Ok(ContentKind::Category),
            other => Err(DatabaseError::UnknownKind(other.to_string())),
        }
    }
}

/// A stored post, page or category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author_or_added_by: String,
    pub category_id: Option<String>,
    pub demo: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for ContentRecord {
    fn resource_id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.author_or_added_by
    }

    fn is_demo(&self) -> bool {
        self.demo
    }
}

/// Fields supplied when creating content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContent {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub demo: bool,
}

/// Content storage operations for one kind
pub struct ContentStorage<'a> {
    db: &'a Database,
    kind: ContentKind,
}

impl<'a> ContentStorage<'a> {
    pub fn new(db: &'a Database, kind: ContentKind) -> Self {
        Self { db, kind }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Create a content item authored by `author_id`
    pub async fn create(&self, author_id: &str, content: NewContent) -> Result<ContentRecord> {
        if content.title.trim().is_empty() {
            return Err(DatabaseError::Validation("title must not be empty".to_string()));
        }

        let now = Utc::now();
        let record = ContentRecord {
            id: Ulid::new().to_string(),
            title: content.title,
            body: content.body,
            author_or_added_by: author_id.to_string(),
            category_id: content.category_id,
            demo: content.demo,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let sql = format!(
            "INSERT INTO {} (id, title, body, author_or_added_by, category_id, demo, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.kind.table_name()
        );
        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.title)
            .bind(&record.body)
            .bind(&record.author_or_added_by)
            .bind(&record.category_id)
            .bind(record.demo)
            .bind(record.is_active)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(self.db.pool())
            .await?;

        info!("Created {} with id: {}", self.kind, record.id);
        Ok(record)
    }

    /// Get a content item by ID
    pub async fn get(&self, id: &str) -> Result<Option<ContentRecord>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", self.kind.table_name());
        let record = sqlx::query_as::<_, ContentRecord>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(record)
    }

    /// Load the subset of `ids` that exists. Missing ids are simply absent.
    pub async fn find_many(&self, ids: &[String]) -> Result<Vec<ContentRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT * FROM {} WHERE id IN ({})",
            self.kind.table_name(),
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, ContentRecord>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let records = query.fetch_all(self.db.pool()).await?;
        debug!("Found {} of {} requested {}", records.len(), ids.len(), self.kind);
        Ok(records)
    }

    /// List content items, newest first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ContentRecord>> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            self.kind.table_name()
        );
        let records = sqlx::query_as::<_, ContentRecord>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await?;
        Ok(records)
    }

    pub async fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.kind.table_name());
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(self.db.pool()).await?;
        Ok(count)
    }

    /// Update title and/or body. Errors if the item does not exist.
    pub async fn update(&self, id: &str, title: Option<String>, body: Option<String>) -> Result<()> {
        if title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DatabaseError::Validation("title must not be empty".to_string()));
        }

        let sql = format!(
            "UPDATE {} SET title = COALESCE(?, title), body = COALESCE(?, body), updated_at = ? WHERE id = ?",
            self.kind.table_name()
        );
        let result = sqlx::query(&sql)
            .bind(title)
            .bind(body)
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::ContentNotFound(format!("{} with id: {}", self.kind, id)));
        }

        info!("Updated {} with id: {}", self.kind, id);
        Ok(())
    }

    /// Delete every listed item, returning how many rows went away
    pub async fn delete_many(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM {} WHERE id IN ({})",
            self.kind.table_name(),
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let deleted = query.execute(self.db.pool()).await?.rows_affected();
        info!("Deleted {} {}", deleted, self.kind);
        Ok(deleted)
    }

    /// Set the active flag on every listed item
    pub async fn set_active_many(&self, ids: &[String], is_active: bool) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE {} SET is_active = ?, updated_at = ? WHERE id IN ({})",
            self.kind.table_name(),
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql).bind(is_active).bind(Utc::now());
        for id in ids {
            query = query.bind(id);
        }

        let updated = query.execute(self.db.pool()).await?.rows_affected();
        info!("Set is_active={} on {} {}", is_active, updated, self.kind);
        Ok(updated)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
