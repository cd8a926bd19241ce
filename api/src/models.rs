use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ApiResult};

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// The signed-in account and what it may do
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub user_type: String,
    pub is_super_admin: bool,
    pub permissions: Vec<String>,
}

/// A post, page or category
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContentResponse {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    /// Author id, or the author's profile when expanded
    #[schema(value_type = Object)]
    pub author: serde_json::Value,
    /// Category id, or the category summary when expanded
    #[schema(value_type = Option<Object>)]
    pub category: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub moderation: ModerationFields,
}

/// Fields only shown to principals that can manage the content kind
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ModerationFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContentListResponse {
    pub items: Vec<ContentResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Request to create content
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateContentRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

/// Request to update content; absent fields are left alone
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateContentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Ids for a bulk operation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkIdsRequest {
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Ids and the active flag to set on them
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkActiveRequest {
    #[serde(default)]
    pub ids: Vec<String>,
    pub is_active: bool,
}

/// Most ids a single bulk request may name. Each id becomes one bound
/// parameter of an `IN (...)` clause.
pub const MAX_BULK_IDS: usize = 500;

/// Requested ids with repeats dropped, first occurrence kept
pub fn distinct_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

pub fn check_batch_size(ids: &[String]) -> ApiResult<()> {
    if ids.len() > MAX_BULK_IDS {
        return Err(ApiError::BadRequest(format!(
            "A bulk request may name at most {} ids, got {}",
            MAX_BULK_IDS,
            ids.len()
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkResponse {
    pub success: bool,
    /// Rows changed
    pub affected: u64,
    /// Requested ids that did not exist
    pub skipped: usize,
}

/// A user account as listed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    #[serde(flatten)]
    pub account: AccountFields,
}

/// Account details only shown to principals that can manage users
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AccountFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Request to create a user account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// New role for an existing account. Without `user_type` the role's
/// default sub-type is used.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: String,
    #[serde(default)]
    pub user_type: Option<String>,
}

/// Pagination parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PaginationParams {
    pub const DEFAULT_PAGE_SIZE: i64 = 20;
    pub const MAX_PAGE_SIZE: i64 = 100;

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        let params = PaginationParams {
            page: Some(0),
            page_size: Some(1000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), PaginationParams::MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams {
            page: Some(3),
            page_size: None,
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_distinct_ids_keeps_first_occurrence() {
        let ids: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(distinct_ids(&ids), vec!["b", "a", "c"]);
        assert!(distinct_ids(&[]).is_empty());
    }

    #[test]
    fn test_batch_size_limit() {
        let at_limit = vec!["x".to_string(); MAX_BULK_IDS];
        assert!(check_batch_size(&at_limit).is_ok());

        let over = vec!["x".to_string(); MAX_BULK_IDS + 1];
        let err = check_batch_size(&over).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_moderation_fields_disappear_when_empty() {
        let json = serde_json::to_value(ModerationFields::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
