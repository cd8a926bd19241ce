//! User account administration

use authz::{
    include_if_permitted, may_assign_role, may_modify_account, Denial, GateOptions, Permission,
    Principal, Role, UserType,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};
use user::{NewUser, SessionContext, UserRecord};

use crate::{
    error::{ApiError, ApiErrorResponse, ApiResult, DenialResponse},
    models::{
        check_batch_size, distinct_ids, AccountFields, BulkActiveRequest, BulkResponse,
        CreateUserRequest, PaginationParams, UpdateRoleRequest, UserListResponse, UserResponse,
    },
    AppState,
};

fn parse_role(role: &str, user_type: Option<&str>) -> ApiResult<(Role, Option<UserType>)> {
    let role: Role = role
        .parse()
        .map_err(|e: authz::AuthzError| ApiError::ValidationError(e.to_string()))?;
    let user_type = user_type
        .map(str::parse::<UserType>)
        .transpose()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;
    Ok((role, user_type))
}

fn user_response(principal: &Principal, user: UserRecord) -> UserResponse {
    let account = include_if_permitted(
        principal,
        Permission::ManageUsers,
        AccountFields {
            email: Some(user.email),
            user_type: Some(user.user_type.to_string()),
            is_active: Some(user.is_active),
            created_at: Some(user.created_at),
        },
    );

    UserResponse {
        id: user.id,
        name: user.name,
        role: user.role.to_string(),
        avatar: user.avatar,
        bio: user.bio,
        account,
    }
}

/// List user accounts
///
/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Accounts listed", body = UserListResponse),
        (status = 403, description = "Access denied", body = DenialResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    ctx: SessionContext,
) -> ApiResult<Json<UserListResponse>> {
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(Permission::ViewUsers)
                .without_db(),
        )
        .await?;

    let records = state
        .users
        .list_users(pagination.page_size(), pagination.offset())
        .await?;
    let total = state.users.count_users().await?;

    Ok(Json(UserListResponse {
        users: records
            .into_iter()
            .map(|user| user_response(&principal, user))
            .collect(),
        total,
        page: pagination.page(),
        page_size: pagination.page_size(),
    }))
}

/// Create a user account
///
/// POST /api/v1/users
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid role or user type", body = ApiErrorResponse),
        (status = 403, description = "Access denied, or admin role reserved", body = DenialResponse),
        (status = 409, description = "Email already registered", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(Permission::ManageUsers)
                .without_db(),
        )
        .await?;

    let (role, user_type) = parse_role(&request.role, request.user_type.as_deref())?;

    if !may_assign_role(&principal, role) {
        warn!("{} tried to create an account with role {}", principal.id, role);
        return Err(Denial::admin_role_restricted().into());
    }

    let created = state
        .users
        .create_user(NewUser {
            name: request.name,
            email: request.email,
            role,
            user_type,
            avatar: request.avatar,
            bio: request.bio,
        })
        .await?;

    info!("{} created account {} ({})", principal.id, created.id, created.role);

    Ok((StatusCode::CREATED, Json(user_response(&principal, created))))
}

/// Activate or deactivate many accounts
///
/// Admin accounts can only be toggled by a super admin or by their owner. A
/// single protected account in the batch refuses the whole batch.
///
/// POST /api/v1/users/bulk/active
#[utoipa::path(
    post,
    path = "/api/v1/users/bulk/active",
    request_body = BulkActiveRequest,
    responses(
        (status = 200, description = "Active flag set", body = BulkResponse),
        (status = 400, description = "Missing, malformed or too many ids", body = DenialResponse),
        (status = 403, description = "Batch contains a protected admin account", body = DenialResponse),
        (status = 404, description = "None of the ids exist", body = DenialResponse)
    ),
    tag = "users"
)]
pub async fn bulk_set_users_active(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(request): Json<BulkActiveRequest>,
) -> ApiResult<Json<BulkResponse>> {
    let requested = distinct_ids(&request.ids);
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(Permission::ManageUsers)
                .validate_id(requested.clone())
                .without_db(),
        )
        .await?;
    check_batch_size(&requested)?;

    let found = state.users.find_many(&requested).await?;
    if found.is_empty() {
        return Err(Denial::not_found().into());
    }

    if let Some(protected) = found
        .iter()
        .find(|user| !may_modify_account(&principal, &user.id, user.role))
    {
        warn!(
            "{} tried to toggle admin account {}, rejecting {} accounts",
            principal.id,
            protected.id,
            found.len()
        );
        return Err(Denial::admin_account_protected().into());
    }

    let ids: Vec<String> = found.iter().map(|user| user.id.clone()).collect();
    let skipped = requested.len().saturating_sub(ids.len());
    let affected = state.users.set_active_many(&ids, request.is_active).await?;

    Ok(Json(BulkResponse {
        success: true,
        affected,
        skipped,
    }))
}

/// Change an account's role and user type
///
/// Granting the admin role and changing an admin account are both reserved
/// to a super admin. An admin may still change their own account.
///
/// POST /api/v1/users/{id}/role
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/role",
    params(("id" = String, Path, description = "Account id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = UserResponse),
        (status = 400, description = "Invalid id, role or user type", body = DenialResponse),
        (status = 403, description = "Admin role or admin account reserved", body = DenialResponse),
        (status = 404, description = "Account not found", body = DenialResponse)
    ),
    tag = "users"
)]
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: SessionContext,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let principal = state
        .authorize(
            &ctx,
            GateOptions::new()
                .require_permission(Permission::ManageUsers)
                .validate_id(id.as_str())
                .without_db(),
        )
        .await?;

    let (role, user_type) = parse_role(&request.role, request.user_type.as_deref())?;

    let target = state
        .users
        .get_user(&id)
        .await?
        .ok_or_else(Denial::not_found)?;

    if !may_modify_account(&principal, &target.id, target.role) {
        warn!("{} tried to change the role of admin account {}", principal.id, target.id);
        return Err(Denial::admin_account_protected().into());
    }
    if !may_assign_role(&principal, role) {
        warn!("{} tried to promote {} to {}", principal.id, target.id, role);
        return Err(Denial::admin_role_restricted().into());
    }

    let user_type = user_type.unwrap_or_else(|| role.default_user_type());
    state.users.update_role(&target.id, role, user_type).await?;
    info!("{} changed {} to {}/{}", principal.id, target.id, role, user_type);

    let updated = state
        .users
        .get_user(&target.id)
        .await?
        .ok_or_else(Denial::not_found)?;
    Ok(Json(user_response(&principal, updated)))
}
