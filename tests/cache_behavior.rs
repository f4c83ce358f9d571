//! Response-cache behavior over the public router: TTL staleness, expiry,
//! and the operator clear action.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header::CONTENT_TYPE};
use bytes::Bytes;
use serde_json::json;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use brusio::application::comments::CommentService;
use brusio::application::feed::FeedService;
use brusio::application::posts::PostService;
use brusio::application::relationships::RelationshipService;
use brusio::application::repos::{CreateUserParams, UsersRepo};
use brusio::cache::{CacheConfig, CacheState, FeedCache, ManualClock};
use brusio::infra::http::{AdminState, HttpState, build_admin_router, build_public_router};
use brusio::infra::memory::MemoryRepositories;

struct Harness {
    public: Router,
    admin: Router,
    store: Arc<MemoryRepositories>,
    clock: ManualClock,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryRepositories::new());
    let clock = ManualClock::new(OffsetDateTime::UNIX_EPOCH);
    let config = CacheConfig::default();
    let cache = Arc::new(FeedCache::new(&config, Arc::new(clock.clone())));

    let feed = Arc::new(FeedService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        10,
    ));
    let posts = Arc::new(PostService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let comments = Arc::new(CommentService::new(store.clone(), store.clone()));
    let relationships = Arc::new(RelationshipService::new(store.clone(), store.clone()));

    let public = build_public_router(HttpState {
        feed,
        posts,
        comments,
        relationships,
        groups: store.clone(),
        cache: Some(CacheState {
            config,
            feed: cache.clone(),
        }),
    });
    let admin = build_admin_router(AdminState {
        users: store.clone(),
        groups: store.clone(),
        health: store.clone(),
        cache: Some(cache),
    });

    Harness {
        public,
        admin,
        store,
        clock,
    }
}

async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.expect("response")
}

async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
}

async fn fetch_global_feed(router: &Router) -> Bytes {
    let response = send(
        router,
        Request::builder()
            .uri("/")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_bytes(response).await
}

async fn publish_post(harness: &Harness, author: Uuid, title: &str) {
    let response = send(
        &harness.public,
        Request::builder()
            .method("POST")
            .uri("/posts")
            .header("x-viewer-id", author.to_string())
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "title": title, "text": "body" }).to_string(),
            ))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn seed_author(harness: &Harness) -> Uuid {
    harness
        .store
        .create_user(CreateUserParams {
            username: "author".to_string(),
        })
        .await
        .expect("user created")
        .id
}

#[tokio::test]
async fn feed_stays_byte_identical_within_the_ttl_window() {
    let harness = harness();
    let author = seed_author(&harness).await;
    publish_post(&harness, author, "before").await;

    let first = fetch_global_feed(&harness.public).await;

    // The write lands, but the cached rendering keeps being served.
    publish_post(&harness, author, "after").await;
    harness.clock.advance(time::Duration::seconds(5));

    let second = fetch_global_feed(&harness.public).await;
    assert_eq!(first, second);
    assert!(!String::from_utf8_lossy(&second).contains("after"));
}

#[tokio::test]
async fn feed_refreshes_after_the_ttl_expires() {
    let harness = harness();
    let author = seed_author(&harness).await;
    publish_post(&harness, author, "before").await;

    let first = fetch_global_feed(&harness.public).await;
    publish_post(&harness, author, "after").await;

    harness.clock.advance(time::Duration::seconds(21));

    let second = fetch_global_feed(&harness.public).await;
    assert_ne!(first, second);
    assert!(String::from_utf8_lossy(&second).contains("after"));
}

#[tokio::test]
async fn operator_clear_takes_effect_immediately() {
    let harness = harness();
    let author = seed_author(&harness).await;
    publish_post(&harness, author, "before").await;

    let first = fetch_global_feed(&harness.public).await;
    publish_post(&harness, author, "after").await;

    // Still within the TTL window, so the stale rendering is served.
    assert_eq!(first, fetch_global_feed(&harness.public).await);

    let cleared = send(
        &harness.admin,
        Request::builder()
            .method("POST")
            .uri("/cache/clear")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(cleared.status(), StatusCode::OK);

    let refreshed = fetch_global_feed(&harness.public).await;
    assert!(String::from_utf8_lossy(&refreshed).contains("after"));
}

#[tokio::test]
async fn feed_pages_are_cached_independently() {
    let harness = harness();
    let author = seed_author(&harness).await;
    for index in 0..15 {
        publish_post(&harness, author, &format!("post {index}")).await;
    }

    let first_page = send(
        &harness.public,
        Request::builder()
            .uri("/?page=1")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    let second_page = send(
        &harness.public,
        Request::builder()
            .uri("/?page=2")
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    let first_bytes = body_bytes(first_page).await;
    let second_bytes = body_bytes(second_page).await;
    assert_ne!(first_bytes, second_bytes);
}

#[tokio::test]
async fn other_feed_modes_bypass_the_cache() {
    let harness = harness();
    let author = seed_author(&harness).await;
    publish_post(&harness, author, "first").await;

    let profile_uri = "/profiles/author";
    let before = send(
        &harness.public,
        Request::builder()
            .uri(profile_uri)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(before.status(), StatusCode::OK);
    let before = body_bytes(before).await;

    publish_post(&harness, author, "second").await;

    let after = send(
        &harness.public,
        Request::builder()
            .uri(profile_uri)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    let after = body_bytes(after).await;
    assert!(String::from_utf8_lossy(&after).contains("second"));
    assert_ne!(before, after);
}
