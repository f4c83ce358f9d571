//! Handler-level tests driving the public router over the embedded store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header::CONTENT_TYPE};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use brusio::application::comments::CommentService;
use brusio::application::feed::FeedService;
use brusio::application::posts::PostService;
use brusio::application::relationships::RelationshipService;
use brusio::application::repos::{CommentsRepo, CreateUserParams, UsersRepo};
use brusio::domain::entities::UserRecord;
use brusio::infra::http::{HttpState, build_public_router};
use brusio::infra::memory::MemoryRepositories;

const PAGE_SIZE: u32 = 10;

fn build_router(store: &Arc<MemoryRepositories>) -> Router {
    let feed = Arc::new(FeedService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        PAGE_SIZE,
    ));
    let posts = Arc::new(PostService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let comments = Arc::new(CommentService::new(store.clone(), store.clone()));
    let relationships = Arc::new(RelationshipService::new(store.clone(), store.clone()));

    build_public_router(HttpState {
        feed,
        posts,
        comments,
        relationships,
        groups: store.clone(),
        cache: None,
    })
}

async fn seed_user(store: &MemoryRepositories, username: &str) -> UserRecord {
    store
        .create_user(CreateUserParams {
            username: username.to_string(),
        })
        .await
        .expect("user created")
}

fn request(method: &str, uri: &str, viewer: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(viewer) = viewer {
        builder = builder.header("x-viewer-id", viewer.to_string());
    }
    match body {
        Some(value) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.expect("response")
}

async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn create_post(router: &Router, author: Uuid, title: &str) -> Value {
    let response = send(
        router,
        request(
            "POST",
            "/posts",
            Some(author),
            Some(json!({ "title": title, "text": "body" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
async fn comment_at_the_length_limit_is_accepted() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;
    let post = create_post(&router, author.id, "hello").await;
    let post_id = post["id"].as_str().expect("post id").to_string();

    let response = send(
        &router,
        request(
            "POST",
            &format!("/posts/{post_id}/comments"),
            Some(author.id),
            Some(json!({ "text": "x".repeat(100) })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn comment_over_the_length_limit_is_rejected() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;
    let post = create_post(&router, author.id, "hello").await;
    let post_id = post["id"].as_str().expect("post id").to_string();
    let post_uuid: Uuid = post_id.parse().expect("uuid");

    let response = send(
        &router,
        request(
            "POST",
            &format!("/posts/{post_id}/comments"),
            Some(author.id),
            Some(json!({ "text": "x".repeat(101) })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(
        store
            .list_comments(post_uuid)
            .await
            .expect("comments")
            .is_empty()
    );
}

#[tokio::test]
async fn anonymous_comments_are_rejected() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;
    let post = create_post(&router, author.id, "hello").await;
    let post_id = post["id"].as_str().expect("post id").to_string();
    let post_uuid: Uuid = post_id.parse().expect("uuid");

    let response = send(
        &router,
        request(
            "POST",
            &format!("/posts/{post_id}/comments"),
            None,
            Some(json!({ "text": "drive-by" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        store
            .list_comments(post_uuid)
            .await
            .expect("comments")
            .is_empty()
    );
}

#[tokio::test]
async fn commenting_on_a_missing_post_is_not_found() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;

    let response = send(
        &router,
        request(
            "POST",
            &format!("/posts/{}/comments", Uuid::new_v4()),
            Some(author.id),
            Some(json!({ "text": "into the void" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn following_feed_requires_a_viewer() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);

    let response = send(&router, request("GET", "/feed", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_follow_conflicts() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let fan = seed_user(&store, "fan").await;
    seed_user(&store, "idol").await;

    let first = send(
        &router,
        request("PUT", "/profiles/idol/follow", Some(fan.id), None),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = send(
        &router,
        request("PUT", "/profiles/idol/follow", Some(fan.id), None),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = read_json(second).await;
    assert_eq!(body["error"]["code"], "already_following");
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let loner = seed_user(&store, "loner").await;

    let response = send(
        &router,
        request("PUT", "/profiles/loner/follow", Some(loner.id), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unfollow_is_idempotent() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let fan = seed_user(&store, "fan").await;
    seed_user(&store, "idol").await;

    send(
        &router,
        request("PUT", "/profiles/idol/follow", Some(fan.id), None),
    )
    .await;

    let first = send(
        &router,
        request("DELETE", "/profiles/idol/follow", Some(fan.id), None),
    )
    .await;
    assert_eq!(first.status(), StatusCode::NO_CONTENT);

    // Absent edge is a no-op, not an error.
    let second = send(
        &router,
        request("DELETE", "/profiles/idol/follow", Some(fan.id), None),
    )
    .await;
    assert_eq!(second.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn editing_anothers_post_is_forbidden() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;
    let intruder = seed_user(&store, "intruder").await;
    let post = create_post(&router, author.id, "mine").await;
    let post_id = post["id"].as_str().expect("post id").to_string();

    let response = send(
        &router,
        request(
            "PATCH",
            &format!("/posts/{post_id}"),
            Some(intruder.id),
            Some(json!({ "title": "stolen", "text": "rewritten" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn authors_can_edit_everything_but_creation_time() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;
    let post = create_post(&router, author.id, "draft").await;
    let post_id = post["id"].as_str().expect("post id").to_string();

    let response = send(
        &router,
        request(
            "PATCH",
            &format!("/posts/{post_id}"),
            Some(author.id),
            Some(json!({ "title": "final", "text": "polished" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["title"], "final");
    assert_eq!(body["created_at"], post["created_at"]);
    assert_eq!(body["author_id"], post["author_id"]);
}

#[tokio::test]
async fn deleting_a_post_removes_its_detail() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;
    let post = create_post(&router, author.id, "ephemeral").await;
    let post_id = post["id"].as_str().expect("post id").to_string();

    let deleted = send(
        &router,
        request("DELETE", &format!("/posts/{post_id}"), Some(author.id), None),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let detail = send(
        &router,
        request("GET", &format!("/posts/{post_id}"), None, None),
    )
    .await;
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn global_feed_returns_the_page_envelope() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;
    create_post(&router, author.id, "first").await;

    let response = send(&router, request("GET", "/", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["page_number"], 1);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["has_next"], false);
    assert_eq!(body["has_previous"], false);
    assert_eq!(body["items"].as_array().expect("items").len(), 1);
}

#[tokio::test]
async fn malformed_viewer_header_is_rejected() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);

    let req = Request::builder()
        .method("GET")
        .uri("/")
        .header("x-viewer-id", "not-a-uuid")
        .body(Body::empty())
        .expect("request");
    let response = send(&router, req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_detail_includes_comments_and_author_count() {
    let store = Arc::new(MemoryRepositories::new());
    let router = build_router(&store);
    let author = seed_user(&store, "author").await;
    let reader = seed_user(&store, "reader").await;
    let post = create_post(&router, author.id, "discussed").await;
    create_post(&router, author.id, "other").await;
    let post_id = post["id"].as_str().expect("post id").to_string();

    send(
        &router,
        request(
            "POST",
            &format!("/posts/{post_id}/comments"),
            Some(reader.id),
            Some(json!({ "text": "nice one" })),
        ),
    )
    .await;

    let response = send(
        &router,
        request("GET", &format!("/posts/{post_id}"), None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["comments"].as_array().expect("comments").len(), 1);
    assert_eq!(body["author_post_count"], 2);
}
