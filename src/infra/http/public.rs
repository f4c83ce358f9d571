//! Public listener: feeds, posts, comments, follow actions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::application::comments::CommentService;
use crate::application::feed::{FeedService, GroupFeed, ProfileFeed};
use crate::application::pagination::Page;
use crate::application::posts::{PostDetail, PostService};
use crate::application::relationships::RelationshipService;
use crate::application::repos::GroupsRepo;
use crate::cache::{CacheState, feed_cache_layer};
use crate::domain::entities::{GroupRecord, PostRecord};

use super::error::ApiError;
use super::middleware::{Viewer, log_responses, set_viewer_context};
use super::models::{CommentBody, PageQuery, PostBody};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub relationships: Arc<RelationshipService>,
    pub groups: Arc<dyn GroupsRepo>,
    pub cache: Option<CacheState>,
}

pub fn build_public_router(state: HttpState) -> Router {
    // Only the global feed is served through the response cache; group,
    // profile, and following listings always hit the store.
    let cached_routes = Router::new().route("/", get(global_feed));
    let cached_routes = if let Some(cache_state) = state.cache.clone() {
        cached_routes.layer(middleware::from_fn_with_state(
            cache_state,
            feed_cache_layer,
        ))
    } else {
        cached_routes
    };

    let routes = Router::new()
        .route("/groups", get(list_groups))
        .route("/groups/{slug}", get(group_feed))
        .route("/profiles/{username}", get(profile_feed))
        .route(
            "/profiles/{username}/follow",
            put(follow_author).delete(unfollow_author),
        )
        .route("/feed", get(following_feed))
        .route("/posts", post(create_post))
        .route(
            "/posts/{id}",
            get(post_detail).patch(edit_post).delete(delete_post),
        )
        .route("/posts/{id}/comments", post(add_comment));

    cached_routes
        .merge(routes)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_viewer_context))
}

async fn global_feed(
    State(state): State<HttpState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PostRecord>>, ApiError> {
    let page = state.feed.global(query.page).await?;
    Ok(Json(page))
}

async fn list_groups(State(state): State<HttpState>) -> Result<Json<Vec<GroupRecord>>, ApiError> {
    let groups = state.groups.list_groups().await?;
    Ok(Json(groups))
}

async fn group_feed(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<GroupFeed>, ApiError> {
    let feed = state.feed.group(&slug, query.page).await?;
    Ok(Json(feed))
}

async fn profile_feed(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProfileFeed>, ApiError> {
    let feed = state.feed.profile(&username, viewer.0, query.page).await?;
    Ok(Json(feed))
}

async fn following_feed(
    State(state): State<HttpState>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PostRecord>>, ApiError> {
    let viewer = viewer.require()?;
    let page = state.feed.following(viewer, query.page).await?;
    Ok(Json(page))
}

async fn create_post(
    State(state): State<HttpState>,
    Extension(viewer): Extension<Viewer>,
    Json(body): Json<PostBody>,
) -> Result<impl IntoResponse, ApiError> {
    let author = viewer.require()?;
    let record = state.posts.create(author, body.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostDetail>, ApiError> {
    let detail = state.posts.detail(id).await?;
    Ok(Json(detail))
}

async fn edit_post(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
    Json(body): Json<PostBody>,
) -> Result<Json<PostRecord>, ApiError> {
    let actor = viewer.require()?;
    let record = state.posts.edit(actor, id, body.into_draft()).await?;
    Ok(Json(record))
}

async fn delete_post(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> Result<StatusCode, ApiError> {
    let actor = viewer.require()?;
    state.posts.delete(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_comment(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
    Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let author = viewer.require()?;
    let record = state.comments.add_comment(id, author, body.text).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn follow_author(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let follower = viewer.require()?;
    let record = state.relationships.follow(follower, &username).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn unfollow_author(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> Result<StatusCode, ApiError> {
    let follower = viewer.require()?;
    state.relationships.unfollow(follower, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
