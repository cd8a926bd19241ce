use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use authz::{AuthorizationGate, GateOptions, Principal, SessionResolver};
use database::ConnectionManager;
use user::{database::UserDatabase, SessionContext};

pub mod error;
pub mod expand;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;

#[cfg(test)]
mod middleware_hooks_tests;
#[cfg(test)]
pub(crate) mod test_support;

pub use server::{spawn_server_with_config, start_server_with_config, ApiConfig};

use error::{ApiError, ApiResult};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Content store, connected on first authorized use
    pub content: Arc<ConnectionManager>,
    /// Identity store
    pub users: Arc<UserDatabase>,
    pub gate: AuthorizationGate<SessionContext>,
}

impl AppState {
    pub fn new(
        content: Arc<ConnectionManager>,
        users: Arc<UserDatabase>,
        resolver: Arc<dyn SessionResolver<SessionContext>>,
    ) -> Self {
        let gate = AuthorizationGate::new(resolver, content.clone());
        Self {
            content,
            users,
            gate,
        }
    }

    /// Run the gate, turning a denial into an [`ApiError::Denied`]
    pub async fn authorize(
        &self,
        request: &SessionContext,
        options: GateOptions,
    ) -> ApiResult<Principal> {
        self.gate
            .authorize(request, &options)
            .await?
            .into_result()
            .map_err(ApiError::Denied)
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::current_user,
        handlers::auth::logout,
        handlers::content::list_content,
        handlers::content::create_content,
        handlers::content::read_content,
        handlers::content::update_content,
        handlers::content::delete_content,
        handlers::content::bulk_delete_content,
        handlers::content::bulk_set_content_active,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::bulk_set_users_active,
        handlers::users::update_user_role,
    ),
    components(
        schemas(
            models::HealthResponse,
            models::DatabaseHealth,
            models::SuccessResponse,
            models::CurrentUserResponse,
            models::ContentResponse,
            models::ModerationFields,
            models::ContentListResponse,
            models::CreateContentRequest,
            models::UpdateContentRequest,
            models::BulkIdsRequest,
            models::BulkActiveRequest,
            models::BulkResponse,
            models::UserResponse,
            models::AccountFields,
            models::UserListResponse,
            models::CreateUserRequest,
            models::UpdateRoleRequest,
            error::ApiErrorResponse,
            error::ErrorDetail,
            error::DenialResponse,
        )
    ),
    tags(
        (name = "content", description = "Posts, pages and categories"),
        (name = "users", description = "User account administration"),
        (name = "auth", description = "Session endpoints"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Inkpress CMS API",
        version = "1.0.0",
        description = "RESTful API for Inkpress CMS",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        // Content endpoints
        .route(
            "/content/:kind",
            get(handlers::content::list_content).post(handlers::content::create_content),
        )
        .route(
            "/content/:kind/bulk/delete",
            post(handlers::content::bulk_delete_content),
        )
        .route(
            "/content/:kind/bulk/active",
            post(handlers::content::bulk_set_content_active),
        )
        .route(
            "/content/:kind/:id",
            get(handlers::content::read_content)
                .post(handlers::content::update_content)
                .delete(handlers::content::delete_content),
        )
        // User administration
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/bulk/active",
            post(handlers::users::bulk_set_users_active),
        )
        .route("/users/:id/role", post(handlers::users::update_user_role))
        // Session endpoints
        .route("/auth/me", get(handlers::auth::current_user))
        .route("/auth/logout", post(handlers::auth::logout))
        // Health check
        .route("/health", get(handlers::health::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::request_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::response_middleware,
        ));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/api/v1/swagger").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
