//! Resolves the expansions of a [`QueryPlan`] against the stores.
//!
//! The plan says which references the principal may see expanded; this module
//! fetches the referenced records and keeps only the selected fields. A
//! reference whose target is gone stays a bare id.

use authz::{populate_if_permitted, Permission, PopulateSpec, Principal, QueryPlan};
use database::{ContentKind, ContentRecord, ContentStorage, Database};
use serde_json::{Map, Value};
use std::collections::HashMap;
use user::database::UserDatabase;

use crate::error::{ApiError, ApiResult};
use crate::models::{ContentResponse, ModerationFields};

pub const AUTHOR_PATH: &str = "author";
pub const CATEGORY_PATH: &str = "category";

/// The read plan for `kind`, expanded as far as `principal` is allowed
pub fn content_plan(kind: ContentKind, principal: &Principal) -> QueryPlan {
    let plan = QueryPlan::new(kind.table_name());
    let plan = populate_if_permitted(
        plan,
        principal,
        Permission::ViewUsers,
        PopulateSpec::new(AUTHOR_PATH).select(["id", "name", "avatar"]),
    );
    if kind == ContentKind::Category {
        return plan;
    }
    populate_if_permitted(
        plan,
        principal,
        Permission::ViewCategories,
        PopulateSpec::new(CATEGORY_PATH).select(["id", "title"]),
    )
}

/// Keep only `select` from `value` (everything when `select` is empty)
pub fn select_fields(value: Value, select: &[String]) -> Value {
    match value {
        Value::Object(map) if !select.is_empty() => {
            let kept: Map<String, Value> = map
                .into_iter()
                .filter(|(key, _)| select.iter().any(|s| s == key))
                .collect();
            Value::Object(kept)
        }
        other => other,
    }
}

/// Turn stored records into responses, resolving the plan's expansions
pub async fn render_content(
    records: Vec<ContentRecord>,
    kind: ContentKind,
    plan: &QueryPlan,
    principal: &Principal,
    content_db: &Database,
    users: &UserDatabase,
) -> ApiResult<Vec<ContentResponse>> {
    let authors = match plan.expansion(AUTHOR_PATH) {
        Some(spec) => load_authors(&records, spec, users).await?,
        None => HashMap::new(),
    };
    let categories = match plan.expansion(CATEGORY_PATH) {
        Some(spec) => load_categories(&records, spec, content_db).await?,
        None => HashMap::new(),
    };

    let moderation_permission = kind.manage_permission();

    Ok(records
        .into_iter()
        .map(|record| {
            let author = authors
                .get(&record.author_or_added_by)
                .cloned()
                .unwrap_or_else(|| Value::String(record.author_or_added_by.clone()));
            let category = record.category_id.as_ref().map(|id| {
                categories
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| Value::String(id.clone()))
            });
            let moderation = authz::include_if_permitted(
                principal,
                moderation_permission,
                ModerationFields {
                    demo: Some(record.demo),
                    is_active: Some(record.is_active),
                },
            );

            ContentResponse {
                id: record.id,
                kind: kind.to_string(),
                title: record.title,
                body: record.body,
                author,
                category,
                created_at: record.created_at,
                updated_at: record.updated_at,
                moderation,
            }
        })
        .collect())
}

async fn load_authors(
    records: &[ContentRecord],
    spec: &PopulateSpec,
    users: &UserDatabase,
) -> ApiResult<HashMap<String, Value>> {
    let mut ids: Vec<String> = records.iter().map(|r| r.author_or_added_by.clone()).collect();
    ids.sort();
    ids.dedup();

    let mut resolved = HashMap::new();
    for user in users.find_many(&ids).await? {
        let profile = serde_json::to_value(user.profile()).map_err(|e| {
            ApiError::InternalError(format!("Failed to serialize author {}: {}", user.id, e))
        })?;
        resolved.insert(user.id.clone(), select_fields(profile, &spec.select));
    }
    Ok(resolved)
}

async fn load_categories(
    records: &[ContentRecord],
    spec: &PopulateSpec,
    content_db: &Database,
) -> ApiResult<HashMap<String, Value>> {
    let mut ids: Vec<String> = records.iter().filter_map(|r| r.category_id.clone()).collect();
    ids.sort();
    ids.dedup();

    let mut resolved = HashMap::new();
    for category in ContentStorage::new(content_db, ContentKind::Category)
        .find_many(&ids)
        .await?
    {
        let summary = serde_json::json!({
            "id": category.id,
            "title": category.title,
            "body": category.body,
        });
        resolved.insert(category.id.clone(), select_fields(summary, &spec.select));
    }
    Ok(resolved)
}
