//! Response cache middleware for the global feed route.
//!
//! Serves buffered renderings to every viewer alike; only successful GET
//! responses are stored. Other feed modes are never routed through here.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::{
    CacheConfig, FeedCache,
    store::{FeedKey, buffer_response, should_store_response},
};

/// Shared cache state for middleware and the operator surface.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub feed: Arc<FeedCache>,
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn feed_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled {
        return next.run(request).await;
    }

    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = FeedKey::new(
        request.uri().path().to_string(),
        request.uri().query().unwrap_or(""),
    );

    if let Some(hit) = cache.feed.get(&key) {
        debug!(outcome = "hit", "serving cached feed response");
        return hit;
    }

    debug!(outcome = "miss", "cache miss, executing handler");
    let response = next.run(request).await;

    if !should_store_response(&response) {
        return response;
    }

    match buffer_response(response).await {
        Ok((rebuilt, cached)) => {
            cache.feed.insert(key, cached);
            rebuilt
        }
        Err((rebuilt, error)) => {
            warn!(error = %error, "feed response could not be buffered for caching");
            rebuilt
        }
    }
}
