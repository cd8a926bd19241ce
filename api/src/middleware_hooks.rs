use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::AppState;

pub const VERSION_HEADER: HeaderName = HeaderName::from_static("x-inkpress-version");
pub const RESPONSE_TIME_HEADER: HeaderName = HeaderName::from_static("x-response-time-ms");

/// Request processing middleware hook
///
/// Logs the incoming request and how long the handler chain took. The elapsed
/// time is stashed in the response extensions for [`response_middleware`].
pub async fn request_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    info!(
        "REQUEST MIDDLEWARE: Processing incoming {} request to {}",
        method, uri
    );

    let mut response = next.run(request).await;

    let elapsed = start.elapsed();
    debug!("REQUEST MIDDLEWARE: Request processed in {:?}", elapsed);
    if response.status().is_client_error() {
        debug!(
            "REQUEST MIDDLEWARE: {} {} refused with {}",
            method,
            uri,
            response.status()
        );
    }

    response.extensions_mut().insert(Elapsed(elapsed.as_millis()));
    Ok(response)
}

/// Milliseconds spent in the handler chain
#[derive(Debug, Clone, Copy)]
pub struct Elapsed(pub u128);

/// Response processing middleware hook
///
/// Stamps every API response with the server version and the handling time.
pub async fn response_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let mut response = next.run(request).await;

    debug!(
        "RESPONSE MIDDLEWARE: Processing response for {} {}",
        method, uri
    );

    let elapsed = response.extensions().get::<Elapsed>().copied();
    let headers = response.headers_mut();
    headers.insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    if let Some(Elapsed(ms)) = elapsed {
        match HeaderValue::from_str(&ms.to_string()) {
            Ok(value) => {
                headers.insert(RESPONSE_TIME_HEADER, value);
            }
            Err(e) => warn!("RESPONSE MIDDLEWARE: Invalid timing header: {}", e),
        }
    }

    Ok(response)
}
