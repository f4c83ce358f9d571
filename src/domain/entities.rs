//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub created_at: OffsetDateTime,
}

/// A topical category posts may optionally belong to.
///
/// Deleting a group never deletes its posts; their group reference is
/// cleared instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    /// Opaque reference into the external blob store; never dereferenced here.
    pub image_path: Option<String>,
    pub created_at: OffsetDateTime,
}

impl PostRecord {
    pub fn is_owner(&self, actor: Uuid) -> bool {
        self.author_id == actor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: OffsetDateTime,
}

/// Directed follow edge: `user_id` watches posts by `author_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
}
