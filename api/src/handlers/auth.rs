//! Session endpoints

use authz::{is_super_admin, permissions_for, GateOptions};
use axum::{extract::State, response::Json, Extension};
use tower_sessions::Session;
use tracing::{debug, info};
use user::{SessionContext, SessionManager};

use crate::{
    error::{ApiError, ApiResult, DenialResponse},
    models::{CurrentUserResponse, SuccessResponse},
    AppState,
};

/// Get the signed-in account
///
/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current account", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated or inactive", body = DenialResponse),
        (status = 403, description = "No session", body = DenialResponse)
    ),
    tag = "auth"
)]
pub async fn current_user(
    State(state): State<AppState>,
    ctx: SessionContext,
) -> ApiResult<Json<CurrentUserResponse>> {
    let principal = state
        .authorize(&ctx, GateOptions::new().without_db())
        .await?;

    let account = state
        .users
        .get_user(&principal.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account".to_string()))?;

    let mut permissions: Vec<String> = permissions_for(principal.role)
        .map(|p| p.as_str().to_string())
        .collect();
    permissions.sort();

    debug!("Returning account details for {}", principal.id);

    Ok(Json(CurrentUserResponse {
        id: account.id,
        name: account.name,
        email: account.email,
        role: principal.role.to_string(),
        user_type: principal.user_type.to_string(),
        is_super_admin: is_super_admin(&principal),
        permissions,
    }))
}

/// End the current session
///
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Session ended", body = SuccessResponse)
    ),
    tag = "auth"
)]
pub async fn logout(session: Option<Extension<Session>>) -> ApiResult<Json<SuccessResponse>> {
    if let Some(Extension(session)) = session {
        SessionManager::destroy_session(&session).await?;
        info!("Session ended");
    }

    Ok(Json(SuccessResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}
