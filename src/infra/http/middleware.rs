use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::ApiError;

/// Header carrying the pre-verified viewer identity.
///
/// Authentication happens upstream; the fronting proxy strips any inbound
/// value and injects the verified one, so by the time a request arrives
/// here the header is either absent (anonymous) or trustworthy.
pub const VIEWER_ID_HEADER: &str = "x-viewer-id";

/// Verified caller identity for the current request; `None` is anonymous.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<Uuid>);

impl Viewer {
    pub fn require(&self) -> Result<Uuid, ApiError> {
        self.0.ok_or_else(ApiError::unauthorized)
    }
}

pub async fn set_viewer_context(mut request: Request<Body>, next: Next) -> Response {
    let viewer = match request.headers().get(VIEWER_ID_HEADER) {
        None => Viewer(None),
        Some(value) => match value.to_str().ok().and_then(|raw| Uuid::parse_str(raw).ok()) {
            Some(id) => Viewer(Some(id)),
            None => {
                return ApiError::bad_request("malformed viewer identity header").into_response();
            }
        },
    };

    request.extensions_mut().insert(viewer);
    next.run(request).await
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();

    if status.is_client_error() || status.is_server_error() {
        warn!(
            target: "brusio::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            elapsed_ms = elapsed_ms,
            "request failed",
        );
    } else {
        info!(
            target: "brusio::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            elapsed_ms = elapsed_ms,
            "request served",
        );
    }

    response
}
