//! TTL'd storage for rendered feed responses.
//!
//! A cached rendering is shared by every viewer; entries expire purely by
//! time-to-live, or all at once through the operator clear action. Writes to
//! the underlying posts never invalidate entries here.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use http_body_util::BodyExt;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use super::clock::Clock;
use super::config::CacheConfig;
use super::lock::rw_write;

const SOURCE: &str = "cache::store";

/// Identifies one cached feed rendering: request path plus query hash.
/// Viewer identity is deliberately absent from the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub path: String,
    pub query_hash: u64,
}

impl FeedKey {
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        Self {
            path: path.into(),
            query_hash: hash_query(query),
        }
    }
}

/// Hash a query string for feed cache key generation.
pub fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

/// Buffered HTTP response ready to be replayed.
#[derive(Clone)]
pub struct CachedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let mut stored_headers = Vec::with_capacity(headers.len());
        for (name, value) in headers.iter() {
            stored_headers.push((name.clone(), value.clone()));
        }

        Self {
            status,
            headers: stored_headers,
            body,
        }
    }

    fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.clear();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

struct CachedEntry {
    stored_at: OffsetDateTime,
    response: CachedResponse,
}

/// Process-wide response cache for the global feed.
///
/// Constructed once at startup and passed by reference to the serving
/// stack; never reached through ambient statics. Concurrent recomputation
/// of an expired entry is allowed to race, last write wins.
pub struct FeedCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<LruCache<FeedKey, CachedEntry>>,
}

impl FeedCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::try_from(config.feed_ttl).unwrap_or(Duration::seconds(20));
        Self {
            ttl,
            clock,
            entries: RwLock::new(LruCache::new(config.response_limit_non_zero())),
        }
    }

    /// Returns a replayable response when a fresh entry exists; expired
    /// entries are dropped on the way out.
    pub fn get(&self, key: &FeedKey) -> Option<Response<Body>> {
        let now = self.clock.now();
        let mut guard = rw_write(&self.entries, SOURCE, "get");

        if let Some(entry) = guard.get(key)
            && now - entry.stored_at < self.ttl
        {
            counter!("brusio_feed_cache_hit_total").increment(1);
            return Some(entry.response.clone().into_response());
        }

        // Absent or expired; an expired entry is evicted here.
        guard.pop(key);
        counter!("brusio_feed_cache_miss_total").increment(1);
        None
    }

    pub fn insert(&self, key: FeedKey, response: CachedResponse) {
        let entry = CachedEntry {
            stored_at: self.clock.now(),
            response,
        };
        rw_write(&self.entries, SOURCE, "insert").put(key, entry);
    }

    /// Operator action: drop every cached rendering at once.
    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
        counter!("brusio_feed_cache_clear_total").increment(1);
    }

    pub fn len(&self) -> usize {
        rw_write(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("failed to buffer response body: {0}")]
    Buffer(String),
}

pub fn should_store_response(response: &Response) -> bool {
    use axum::http::header;

    if !response.status().is_success() {
        return false;
    }

    if response.headers().contains_key(header::SET_COOKIE) {
        return false;
    }

    true
}

/// Buffer a response body so one copy can be cached and one returned.
pub async fn buffer_response(
    response: Response,
) -> Result<(Response, CachedResponse), (Response, CacheStoreError)> {
    let (parts, body) = response.into_parts();
    match BodyExt::collect(body).await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let cached = CachedResponse::new(parts.status, &parts.headers, bytes.clone());
            let rebuilt = Response::from_parts(parts, Body::from(bytes));
            Ok((rebuilt, cached))
        }
        Err(error) => {
            let rebuilt = Response::from_parts(parts, Body::empty());
            Err((rebuilt, CacheStoreError::Buffer(error.to_string())))
        }
    }
}
