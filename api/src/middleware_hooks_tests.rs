//! Tests for the request/response middleware hooks
//!
//! Both hooks wrap every `/api/v1` route, so denials and errors must carry the
//! same headers as successful responses.

#[cfg(test)]
mod tests {
    use super::super::middleware_hooks::{RESPONSE_TIME_HEADER, VERSION_HEADER};
    use crate::test_support::{TestApp, TEST_USER_HEADER};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn headers_for(app: &TestApp, uri: &str, user: Option<&str>) -> axum::http::HeaderMap {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header(TEST_USER_HEADER, user);
        }
        let response = app
            .router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers().clone()
    }

    #[tokio::test]
    async fn test_version_header_on_success() {
        let app = TestApp::new().await;
        let headers = headers_for(&app, "/api/v1/health", None).await;

        assert_eq!(
            headers.get(VERSION_HEADER).unwrap(),
            env!("CARGO_PKG_VERSION")
        );
        assert!(headers.contains_key(RESPONSE_TIME_HEADER));
    }

    #[tokio::test]
    async fn test_headers_on_denial() {
        let app = TestApp::new().await;
        let headers = headers_for(&app, "/api/v1/auth/me", None).await;

        assert!(headers.contains_key(VERSION_HEADER));
        let elapsed: u128 = headers
            .get(RESPONSE_TIME_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(elapsed < 60_000);
    }

    #[tokio::test]
    async fn test_swagger_is_outside_api_hooks() {
        let app = TestApp::new().await;
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(VERSION_HEADER));
    }
}
