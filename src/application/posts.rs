//! Post lifecycle: create, read with comments, edit, delete.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CreatePostParams, GroupsRepo, PostQueryFilter, PostsRepo, PostsWriteRepo,
    RepoError, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::error::DomainError;
use crate::domain::posts::{validate_post_text, validate_post_title};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,
    #[error("only the author may modify a post")]
    Forbidden,
    #[error("unknown group")]
    UnknownGroup,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Author-supplied fields of a new or edited post.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image_path: Option<String>,
}

/// One post with its comment thread and the author's total post count.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
    pub author_post_count: u64,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            posts,
            writer,
            comments,
            groups,
        }
    }

    pub async fn create(&self, author_id: Uuid, draft: PostDraft) -> Result<PostRecord, PostError> {
        self.validate_draft(&draft).await?;

        let record = self
            .writer
            .create_post(CreatePostParams {
                title: draft.title,
                text: draft.text,
                author_id,
                group_id: draft.group_id,
                image_path: draft.image_path,
            })
            .await?;

        Ok(record)
    }

    pub async fn detail(&self, post_id: Uuid) -> Result<PostDetail, PostError> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(PostError::NotFound)?;

        let comments = self.comments.list_comments(post.id).await?;
        let author_post_count = self
            .posts
            .count_posts(&PostQueryFilter::for_author(post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }

    /// Replaces every author-editable field; creation time and authorship
    /// never change.
    pub async fn edit(
        &self,
        actor: Uuid,
        post_id: Uuid,
        draft: PostDraft,
    ) -> Result<PostRecord, PostError> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(PostError::NotFound)?;
        if !post.is_owner(actor) {
            return Err(PostError::Forbidden);
        }

        self.validate_draft(&draft).await?;

        let record = self
            .writer
            .update_post(UpdatePostParams {
                id: post.id,
                title: draft.title,
                text: draft.text,
                group_id: draft.group_id,
                image_path: draft.image_path,
            })
            .await?;

        Ok(record)
    }

    pub async fn delete(&self, actor: Uuid, post_id: Uuid) -> Result<(), PostError> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(PostError::NotFound)?;
        if !post.is_owner(actor) {
            return Err(PostError::Forbidden);
        }

        self.writer.delete_post(post.id).await?;
        Ok(())
    }

    async fn validate_draft(&self, draft: &PostDraft) -> Result<(), PostError> {
        validate_post_title(&draft.title)?;
        validate_post_text(&draft.text)?;

        if let Some(group_id) = draft.group_id
            && self.groups.find_group(group_id).await?.is_none()
        {
            return Err(PostError::UnknownGroup);
        }

        Ok(())
    }
}
