//! Admin listener: health, provisioning, and cache control.
//!
//! Bound separately from the public listener; deployments keep this port
//! off the public network.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::application::repos::{
    CreateGroupParams, CreateUserParams, GroupsRepo, StoreHealth, UsersRepo,
};
use crate::cache::FeedCache;

use super::error::ApiError;
use super::middleware::log_responses;
use super::models::{CreateGroupBody, CreateUserBody};

#[derive(Clone)]
pub struct AdminState {
    pub users: Arc<dyn UsersRepo>,
    pub groups: Arc<dyn GroupsRepo>,
    pub health: Arc<dyn StoreHealth>,
    pub cache: Option<Arc<FeedCache>>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", post(create_user))
        .route("/users/{id}", delete(delete_user))
        .route("/groups", post(create_group))
        .route("/groups/{id}", delete(delete_group))
        .route("/cache/clear", post(clear_cache))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
}

async fn health(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    state.health.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn create_user(
    State(state): State<AdminState>,
    Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError> {
    let username = body.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::validation("username must not be empty"));
    }

    let record = state.users.create_user(CreateUserParams { username }).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Deleting a user cascades over their posts, comments on those posts,
/// their own comments, and every follow edge touching them.
async fn delete_user(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_group(
    State(state): State<AdminState>,
    Json(body): Json<CreateGroupBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::validation("group title must not be empty"));
    }

    let slug = match body.slug {
        Some(slug) if !slug.trim().is_empty() => slug,
        _ => slug::slugify(&body.title),
    };

    let record = state
        .groups
        .create_group(CreateGroupParams {
            title: body.title,
            slug,
            description: body.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Deleting a group clears the group reference on its posts; the posts
/// themselves survive.
async fn delete_group(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.groups.delete_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cache(State(state): State<AdminState>) -> Json<serde_json::Value> {
    match state.cache.as_ref() {
        Some(cache) => {
            cache.clear();
            Json(json!({ "cleared": true }))
        }
        None => Json(json!({ "cleared": false })),
    }
}
