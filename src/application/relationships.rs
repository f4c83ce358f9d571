//! Follow/unfollow policy between users.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};
use crate::domain::entities::{FollowRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RelationshipError {
    #[error("users cannot follow themselves")]
    SelfFollow,
    #[error("already following this author")]
    AlreadyFollowing,
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct RelationshipService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl RelationshipService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    /// Creates a follow edge toward the author named by `username`.
    ///
    /// Self-follows are rejected outright. Duplicate edges are attempted
    /// anyway and rejected by the storage uniqueness constraint, which
    /// closes the race between two concurrent follow calls for the pair.
    pub async fn follow(
        &self,
        follower: Uuid,
        username: &str,
    ) -> Result<FollowRecord, RelationshipError> {
        let author = self.resolve_author(username).await?;
        if author.id == follower {
            return Err(RelationshipError::SelfFollow);
        }

        match self.follows.create_follow(follower, author.id).await {
            Ok(record) => Ok(record),
            Err(RepoError::Duplicate { .. }) => Err(RelationshipError::AlreadyFollowing),
            Err(other) => Err(other.into()),
        }
    }

    /// Removes the follow edge toward `username`; an absent edge is a no-op.
    pub async fn unfollow(&self, follower: Uuid, username: &str) -> Result<(), RelationshipError> {
        let author = self.resolve_author(username).await?;
        self.follows.delete_follow(follower, author.id).await?;
        Ok(())
    }

    async fn resolve_author(&self, username: &str) -> Result<UserRecord, RelationshipError> {
        self.users
            .find_user_by_username(username)
            .await?
            .ok_or(RelationshipError::UnknownAuthor)
    }
}
