//! JSON error envelope for both listeners.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::comments::CommentError;
use crate::application::feed::FeedError;
use crate::application::posts::PostError;
use crate::application::relationships::RelationshipError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const VALIDATION: &str = "validation_error";
    pub const SELF_FOLLOW: &str = "self_follow";
    pub const ALREADY_FOLLOWING: &str = "already_following";
    pub const DUPLICATE: &str = "duplicate";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            hint,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, None)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "authenticated viewer required",
            None,
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, codes::FORBIDDEN, message, None)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::VALIDATION, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message,
                hint: self.hint,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound => Self::not_found("resource not found"),
            RepoError::Duplicate { constraint } => Self::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "duplicate record",
                Some(format!("unique constraint `{constraint}`")),
            ),
            RepoError::InvalidInput { message } => Self::bad_request(message),
            RepoError::Integrity { message } => Self::new(
                StatusCode::CONFLICT,
                codes::INTEGRITY,
                "integrity constraint violated",
                Some(message),
            ),
            RepoError::Timeout => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "storage timeout",
                None,
            ),
            RepoError::Persistence(message) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "storage failure",
                Some(message),
            ),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NotFound { entity } => Self::not_found(format!("{entity} not found")),
            DomainError::Validation { message } => Self::validation(message),
            DomainError::Invariant { message } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "invariant violated",
                Some(message),
            ),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::UnknownGroup => Self::not_found("group not found"),
            FeedError::UnknownAuthor => Self::not_found("author not found"),
            FeedError::Repo(err) => err.into(),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(error: PostError) -> Self {
        match error {
            PostError::NotFound => Self::not_found("post not found"),
            PostError::Forbidden => Self::forbidden("only the author may modify a post"),
            PostError::UnknownGroup => Self::bad_request("post references an unknown group"),
            PostError::Domain(err) => err.into(),
            PostError::Repo(err) => err.into(),
        }
    }
}

impl From<CommentError> for ApiError {
    fn from(error: CommentError) -> Self {
        match error {
            CommentError::PostNotFound => Self::not_found("post not found"),
            CommentError::Domain(err) => err.into(),
            CommentError::Repo(err) => err.into(),
        }
    }
}

impl From<RelationshipError> for ApiError {
    fn from(error: RelationshipError) -> Self {
        match error {
            RelationshipError::SelfFollow => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                codes::SELF_FOLLOW,
                "users cannot follow themselves",
                None,
            ),
            RelationshipError::AlreadyFollowing => Self::new(
                StatusCode::CONFLICT,
                codes::ALREADY_FOLLOWING,
                "already following this author",
                None,
            ),
            RelationshipError::UnknownAuthor => Self::not_found("author not found"),
            RelationshipError::Repo(err) => err.into(),
        }
    }
}
