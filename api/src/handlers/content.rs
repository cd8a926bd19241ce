//! Content controllers for posts, pages and categories.
//!
//! Every handler runs the gate first. Mutations then load the targeted
//! records and apply the kind's ownership policy before touching anything.

use authz::{GateOptions, OwnershipPolicy};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use database::{ContentKind, ContentStorage, NewContent};
use tracing::{debug, info};
use user::SessionContext;

use crate::{
    error::{ApiError, ApiErrorResponse, ApiResult, DenialResponse},
    expand::{content_plan, render_content},
    models::{
        check_batch_size, distinct_ids, BulkActiveRequest, BulkIdsRequest, BulkResponse,
        ContentListResponse, ContentResponse, CreateContentRequest, PaginationParams,
        SuccessResponse, UpdateContentRequest,
    },
    AppState,
};

/// Parse the `{kind}` segment. An unknown kind is only reported as 404 to a
/// caller that passes the session and active-account checks.
async fn resolve_kind(
    state: &AppState,
    ctx: &SessionContext,
    kind: &str,
) -> ApiResult<ContentKind> {
    match kind.parse::<ContentKind>() {
        Ok(kind) => Ok(kind),
        Err(e) => {
            state.authorize(ctx, GateOptions::new().without_db()).await?;
            Err(e.into())
        }
    }
}

/// List content of one kind
///
/// GET /api/v1/content/{kind}
#[utoipa::path(
    get,
    path = "/api/v1/content/{kind}",
    params(
        ("kind" = String, Path, description = "posts, pages or categories"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Content listed", body = ContentListResponse),
        (status = 403, description = "Access denied", body = DenialResponse)
    ),
    tag = "content"
)]
pub async fn list_content(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(pagination): Query<PaginationParams>,
    ctx: SessionContext,
) -> ApiResult<Json<ContentListResponse>> {
    let kind = resolve_kind(&state, &ctx, &kind).await?;
    let principal = state
        .authorize(&ctx, GateOptions::new().require_permission(kind.view_permission()))
        .await?;

    let db = state.content.get().await?;
    let storage = ContentStorage::new(&db, kind);
    let records = storage
        .list(pagination.page_size(), pagination.offset())
        .await?;
    let total = storage.count().await?;

    let plan = content_plan(kind, &principal);
    let items = render_content(records, kind, &plan, &principal, &db, &state.users).await?;

    Ok(Json(ContentListResponse {
        items,
        total,
        page: pagination.page(),
        page_size: pagination.page_size(),
    }))
}

/// Create content authored by the caller
///
/// POST /api/v1/content/{kind}
#[utoipa::path(
    post,
    path = "/api/v1/content/{kind}",
    params(("kind" = String, Path, description = "posts, pages or categories")),
    request_body = CreateContentRequest,
    responses(
        (status = 201, description = "Content created", body = ContentResponse),
        (status = 400, description = "Invalid category id", body = DenialResponse),
        (status = 403, description = "Access denied", body = DenialResponse)
    ),
    tag = "content"
)]
pub async fn create_content(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    ctx: SessionContext,
    Json(request): Json<CreateContentRequest>,
) -> ApiResult<impl IntoResponse> {
    let kind = resolve_kind(&state, &ctx, &kind).await?;

    let mut options = GateOptions::new().require_permission(kind.manage_permission());
    if let Some(category_id) = &request.category_id {
        options = options.validate_id(category_id.as_str());
    }
    let principal = state.authorize(&ctx, options).await?;

    let db = state.content.get().await?;

    if let Some(category_id) = &request.category_id {
        let category = ContentStorage::new(&db, ContentKind::Category)
            .get(category_id)
            .await?;
        if category.is_none() {
            return Err(ApiError::ValidationError(format!(
                "Unknown category: {}",
                category_id
            )));
        }
    }

    let record = ContentStorage::new(&db, kind)
        .create(
            &principal.id,
            NewContent {
                title: request.title,
                body: request.body,
                category_id: request.category_id,
                demo: false,
            },
        )
        .await?;

    info!("{} created {} {}", principal.id, kind, record.id);

    let plan = content_plan(kind, &principal);
    let mut rendered =
        render_content(vec![record], kind, &plan, &principal, &db, &state.users).await?;
    let created = rendered
        .pop()
        .ok_or_else(|| ApiError::InternalError("created record was not rendered".to_string()))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Read one content item
///
/// GET /api/v1/content/{kind}/{id}
#[utoipa::path(
    get,
    path = "/api/v1/content/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "posts, pages or categories"),
        ("id" = String, Path, description = "Content id")
    ),
    responses(
        (status = 200, description = "Content found", body = ContentResponse),
        (status = 400, description = "Invalid id", body = DenialResponse),
        (status = 404, description = "Content not found", body = ApiErrorResponse)
    ),
    tag = "content"
)]
pub async fn read_content(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    ctx: SessionContext,
) -> ApiResult<Json<ContentResponse>> {
    let kind = resolve_kind(&state, &ctx, &kind).await?;
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(kind.view_permission())
                .validate_id(id.as_str()),
        )
        .await?;

    let db = state.content.get().await?;
    let record = ContentStorage::new(&db, kind)
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} with id: {}", kind, id)))?;

    let plan = content_plan(kind, &principal);
    let mut rendered =
        render_content(vec![record], kind, &plan, &principal, &db, &state.users).await?;
    rendered
        .pop()
        .map(Json)
        .ok_or_else(|| ApiError::InternalError("record was not rendered".to_string()))
}

/// Update title and/or body
///
/// POST /api/v1/content/{kind}/{id}
#[utoipa::path(
    post,
    path = "/api/v1/content/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "posts, pages or categories"),
        ("id" = String, Path, description = "Content id")
    ),
    request_body = UpdateContentRequest,
    responses(
        (status = 200, description = "Content updated", body = SuccessResponse),
        (status = 403, description = "Not the owner, or demo data", body = DenialResponse),
        (status = 404, description = "Content not found", body = DenialResponse)
    ),
    tag = "content"
)]
pub async fn update_content(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    ctx: SessionContext,
    Json(request): Json<UpdateContentRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let kind = resolve_kind(&state, &ctx, &kind).await?;
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(kind.manage_permission())
                .validate_id(id.as_str()),
        )
        .await?;

    let db = state.content.get().await?;
    let storage = ContentStorage::new(&db, kind);
    let record = storage.get(&id).await?;

    OwnershipPolicy::single(kind.ownership_bypass()).authorize_one(&principal, record.as_ref())?;

    storage.update(&id, request.title, request.body).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: format!("Updated {}", id),
    }))
}

/// Delete one content item
///
/// DELETE /api/v1/content/{kind}/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/content/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "posts, pages or categories"),
        ("id" = String, Path, description = "Content id")
    ),
    responses(
        (status = 200, description = "Content deleted", body = SuccessResponse),
        (status = 403, description = "Not the owner, or demo data", body = DenialResponse),
        (status = 404, description = "Content not found", body = DenialResponse)
    ),
    tag = "content"
)]
pub async fn delete_content(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    ctx: SessionContext,
) -> ApiResult<Json<SuccessResponse>> {
    let kind = resolve_kind(&state, &ctx, &kind).await?;
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(kind.delete_permission())
                .validate_id(id.as_str()),
        )
        .await?;

    let db = state.content.get().await?;
    let storage = ContentStorage::new(&db, kind);
    let record = storage.get(&id).await?;

    OwnershipPolicy::single(kind.ownership_bypass()).authorize_one(&principal, record.as_ref())?;

    storage.delete_many(&[id.clone()]).await?;
    info!("{} deleted {} {}", principal.id, kind, id);

    Ok(Json(SuccessResponse {
        success: true,
        message: format!("Deleted {}", id),
    }))
}

/// Delete many content items. Ids that do not exist are skipped.
///
/// POST /api/v1/content/{kind}/bulk/delete
#[utoipa::path(
    post,
    path = "/api/v1/content/{kind}/bulk/delete",
    params(("kind" = String, Path, description = "posts, pages or categories")),
    request_body = BulkIdsRequest,
    responses(
        (status = 200, description = "Content deleted", body = BulkResponse),
        (status = 400, description = "Missing, malformed or too many ids", body = DenialResponse),
        (status = 403, description = "A record is not the caller's, or is demo data", body = DenialResponse),
        (status = 404, description = "None of the ids exist", body = DenialResponse)
    ),
    tag = "content"
)]
pub async fn bulk_delete_content(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    ctx: SessionContext,
    Json(request): Json<BulkIdsRequest>,
) -> ApiResult<Json<BulkResponse>> {
    let kind = resolve_kind(&state, &ctx, &kind).await?;
    let requested = distinct_ids(&request.ids);
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(kind.delete_permission())
                .validate_id(requested.clone()),
        )
        .await?;
    check_batch_size(&requested)?;

    let db = state.content.get().await?;
    let storage = ContentStorage::new(&db, kind);
    let found = storage.find_many(&requested).await?;

    let allowed = OwnershipPolicy::bulk(kind.ownership_bypass()).authorize(
        &principal,
        &requested,
        &found,
    )?;
    let ids: Vec<String> = allowed.iter().map(|record| record.id.clone()).collect();
    let skipped = requested.len().saturating_sub(ids.len());

    let affected = storage.delete_many(&ids).await?;
    debug!("Bulk delete of {} skipped {} missing ids", kind, skipped);

    Ok(Json(BulkResponse {
        success: true,
        affected,
        skipped,
    }))
}

/// Activate or deactivate many content items. Ids that do not exist are
/// skipped.
///
/// POST /api/v1/content/{kind}/bulk/active
#[utoipa::path(
    post,
    path = "/api/v1/content/{kind}/bulk/active",
    params(("kind" = String, Path, description = "posts, pages or categories")),
    request_body = BulkActiveRequest,
    responses(
        (status = 200, description = "Active flag set", body = BulkResponse),
        (status = 400, description = "Missing, malformed or too many ids", body = DenialResponse),
        (status = 403, description = "A record is not the caller's, or is demo data", body = DenialResponse),
        (status = 404, description = "None of the ids exist", body = DenialResponse)
    ),
    tag = "content"
)]
pub async fn bulk_set_content_active(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    ctx: SessionContext,
    Json(request): Json<BulkActiveRequest>,
) -> ApiResult<Json<BulkResponse>> {
    let kind = resolve_kind(&state, &ctx, &kind).await?;
    let requested = distinct_ids(&request.ids);
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(kind.manage_permission())
                .validate_id(requested.clone()),
        )
        .await?;
    check_batch_size(&requested)?;

    let db = state.content.get().await?;
    let storage = ContentStorage::new(&db, kind);
    let found = storage.find_many(&requested).await?;

    let allowed = OwnershipPolicy::bulk(kind.ownership_bypass()).authorize(
        &principal,
        &requested,
        &found,
    )?;
    let ids: Vec<String> = allowed.iter().map(|record| record.id.clone()).collect();
    let skipped = requested.len().saturating_sub(ids.len());

    let affected = storage.set_active_many(&ids, request.is_active).await?;

    Ok(Json(BulkResponse {
        success: true,
        affected,
        skipped,
    }))
}

#[cfg(test)]
mod tests {
    use crate::{models::MAX_BULK_IDS, test_support::TestApp};
    use axum::http::StatusCode;
    use database::ContentKind;
    use serde_json::json;
    use ulid::Ulid;

    #[tokio::test]
    async fn test_permission_denial_never_connects_store() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/pages",
                Some(&app.reader.id),
                Some(json!({"title": "Nope"})),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"status": 403, "error": "Access Denied"}));
        assert_eq!(app.state.content.connect_attempts(), 0);
        assert!(!app.state.content.is_connected());
    }

    #[tokio::test]
    async fn test_inactive_beats_invalid_id() {
        let app = TestApp::new().await;
        app.state
            .users
            .set_active_many(&[app.author.id.clone()], false)
            .await
            .unwrap();

        let (status, body) = app
            .send("GET", "/api/v1/content/posts/not-an-id", Some(&app.author.id), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "User not Allowed To Perform Any Actions!");
    }

    #[tokio::test]
    async fn test_malformed_id() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send("GET", "/api/v1/content/posts/not-an-id", Some(&app.author.id), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"status": 400, "error": "Invalid ID"}));
    }

    #[tokio::test]
    async fn test_unknown_kind_is_not_found() {
        let app = TestApp::new().await;
        let (status, _) = app
            .send("GET", "/api/v1/content/widgets", Some(&app.admin.id), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_kind_still_requires_session() {
        let app = TestApp::new().await;
        let (status, body) = app.send("GET", "/api/v1/content/widgets", None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"status": 403, "error": "Session not Found"}));

        app.state
            .users
            .set_active_many(&[app.author.id.clone()], false)
            .await
            .unwrap();
        let (status, _) = app
            .send("GET", "/api/v1/content/widgets", Some(&app.author.id), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(app.state.content.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_create_then_read_with_projection() {
        let app = TestApp::new().await;
        let category = app
            .seed_content(ContentKind::Category, &app.admin, "Rust", false)
            .await;

        let (status, created) = app
            .send(
                "POST",
                "/api/v1/content/posts",
                Some(&app.author.id),
                Some(json!({"title": "Ownership", "body": "text", "category_id": category.id})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        // Authors lack VIEW_USERS: author stays a bare id, category expands
        assert_eq!(created["author"], json!(app.author.id));
        assert_eq!(created["category"]["title"], "Rust");
        assert_eq!(created["demo"], false);

        // Readers see neither moderation fields nor an expanded author
        let (status, read) = app
            .send("GET", &format!("/api/v1/content/posts/{}", id), Some(&app.reader.id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(read.get("demo").is_none());
        assert!(read.get("is_active").is_none());
        assert!(read["author"].is_string());

        // Admins see the author profile with selected fields only
        let (_, read) = app
            .send("GET", &format!("/api/v1/content/posts/{}", id), Some(&app.admin.id), None)
            .await;
        assert_eq!(read["author"]["name"], "Ada");
        assert!(read["author"].get("bio").is_none());
    }

    #[tokio::test]
    async fn test_create_with_malformed_category() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/posts",
                Some(&app.author.id),
                Some(json!({"title": "t", "category_id": "bad"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid ID");
    }

    #[tokio::test]
    async fn test_single_delete_missing_is_not_found() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(
                "DELETE",
                &format!("/api/v1/content/posts/{}", Ulid::new()),
                Some(&app.super_admin.id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_update_foreign_post_is_refused() {
        let app = TestApp::new().await;
        let post = app
            .seed_content(ContentKind::Post, &app.other_author, "Theirs", false)
            .await;

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/v1/content/posts/{}", post.id),
                Some(&app.author.id),
                Some(json!({"title": "Mine now"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "You can only modify resources you created!");
        assert_eq!(
            app.get_content(ContentKind::Post, &post.id).await.unwrap().title,
            "Theirs"
        );
    }

    #[tokio::test]
    async fn test_bulk_delete_with_foreign_record_deletes_nothing() {
        let app = TestApp::new().await;
        let mine = app
            .seed_content(ContentKind::Post, &app.author, "A", false)
            .await;
        let theirs = app
            .seed_content(ContentKind::Post, &app.other_author, "B", false)
            .await;

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/content/posts/bulk/delete",
                Some(&app.author.id),
                Some(json!({"ids": [mine.id, theirs.id]})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(app.get_content(ContentKind::Post, &mine.id).await.is_some());
        assert!(app.get_content(ContentKind::Post, &theirs.id).await.is_some());
    }

    #[tokio::test]
    async fn test_bulk_toggle_with_demo_record_changes_nothing() {
        let app = TestApp::new().await;
        let plain = app
            .seed_content(ContentKind::Category, &app.admin, "C", false)
            .await;
        let demo = app
            .seed_content(ContentKind::Category, &app.admin, "D", true)
            .await;

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/categories/bulk/active",
                Some(&app.admin.id),
                Some(json!({"ids": [plain.id, demo.id], "is_active": false})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Demo data can only be modified by a super admin!");
        assert!(app.get_content(ContentKind::Category, &plain.id).await.unwrap().is_active);
        assert!(app.get_content(ContentKind::Category, &demo.id).await.unwrap().is_active);

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/categories/bulk/active",
                Some(&app.super_admin.id),
                Some(json!({"ids": [plain.id, demo.id], "is_active": false})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["affected"], 2);
    }

    #[tokio::test]
    async fn test_bulk_skips_missing_ids() {
        let app = TestApp::new().await;
        let mine = app
            .seed_content(ContentKind::Post, &app.author, "A", false)
            .await;

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/posts/bulk/delete",
                Some(&app.author.id),
                Some(json!({"ids": [mine.id, Ulid::new().to_string()]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["affected"], 1);
        assert_eq!(body["skipped"], 1);
    }

    #[tokio::test]
    async fn test_bulk_repeated_id_is_not_skipped() {
        let app = TestApp::new().await;
        let mine = app
            .seed_content(ContentKind::Post, &app.author, "A", false)
            .await;

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/posts/bulk/delete",
                Some(&app.author.id),
                Some(json!({"ids": [mine.id, mine.id]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["affected"], 1);
        assert_eq!(body["skipped"], 0);

        let missing = Ulid::new().to_string();
        let other = app
            .seed_content(ContentKind::Post, &app.author, "B", false)
            .await;
        let (_, body) = app
            .send(
                "POST",
                "/api/v1/content/posts/bulk/active",
                Some(&app.author.id),
                Some(json!({"ids": [other.id, missing, missing], "is_active": false})),
            )
            .await;
        assert_eq!(body["affected"], 1);
        assert_eq!(body["skipped"], 1);
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected() {
        let app = TestApp::new().await;
        let ids: Vec<String> = (0..=MAX_BULK_IDS).map(|_| Ulid::new().to_string()).collect();

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/posts/bulk/delete",
                Some(&app.super_admin.id),
                Some(json!({ "ids": ids })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_bulk_with_malformed_member_is_rejected() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/posts/bulk/delete",
                Some(&app.super_admin.id),
                Some(json!({"ids": [Ulid::new().to_string(), "oops"]})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid ID(s)");
    }

    #[tokio::test]
    async fn test_empty_batch_requires_ids() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/content/pages/bulk/active",
                Some(&app.admin.id),
                Some(json!({"ids": [], "is_active": true})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ID is required");
        assert_eq!(app.state.content.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_category_bypass_for_any_admin_but_not_pages() {
        let app = TestApp::new().await;
        let category = app
            .seed_content(ContentKind::Category, &app.super_admin, "Shared", false)
            .await;
        let page = app
            .seed_content(ContentKind::Page, &app.super_admin, "About", false)
            .await;

        let (status, _) = app
            .send(
                "DELETE",
                &format!("/api/v1/content/categories/{}", category.id),
                Some(&app.admin.id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send(
                "DELETE",
                &format!("/api/v1/content/pages/{}", page.id),
                Some(&app.admin.id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let app = TestApp::new().await;
        for i in 0..3 {
            app.seed_content(ContentKind::Page, &app.admin, &format!("P{}", i), false)
                .await;
        }

        let (status, body) = app
            .send("GET", "/api/v1/content/pages?page=1&page_size=2", Some(&app.reader.id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
    }
}
