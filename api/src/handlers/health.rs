use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    error::ApiResult,
    models::{DatabaseHealth, HealthResponse},
    AppState,
};

/// Health check endpoint
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("Health check requested");

    let db_health = match state.content.get().await {
        Ok(db) => match sqlx::query("SELECT 1").fetch_one(db.pool()).await {
            Ok(_) => DatabaseHealth {
                connected: true,
                message: "Database connection successful".to_string(),
            },
            Err(e) => {
                warn!("Health query failed: {}", e);
                DatabaseHealth {
                    connected: false,
                    message: "Database query failed".to_string(),
                }
            }
        },
        Err(e) => {
            warn!("Health check could not connect: {}", e);
            DatabaseHealth {
                connected: false,
                message: "Database connection failed".to_string(),
            }
        }
    };

    let response = HealthResponse {
        status: if db_health.connected {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        database: db_health,
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_needs_no_session() {
        let app = TestApp::new().await;
        let (status, body) = app.send("GET", "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"]["connected"], true);
    }
}
