//! Embedded in-memory store.
//!
//! Backs test runs and database-less deployments with the same relational
//! rules as the Postgres adapter. All state sits behind a single writer
//! lock, so every cascading or nullifying delete is atomic with respect to
//! concurrent readers: a reader observes related rows either fully present
//! or fully absent, never in between.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, CreateUserParams,
    FollowsRepo, GroupsRepo, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError, StoreHealth,
    UpdatePostParams, UsersRepo,
};
use crate::domain::entities::{CommentRecord, FollowRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserRecord>,
    groups: HashMap<Uuid, GroupRecord>,
    posts: HashMap<Uuid, PostRecord>,
    comments: HashMap<Uuid, CommentRecord>,
    follows: HashMap<Uuid, FollowRecord>,
}

impl MemoryState {
    fn post_matches(&self, post: &PostRecord, filter: &PostQueryFilter) -> bool {
        if let Some(group_id) = filter.group_id
            && post.group_id != Some(group_id)
        {
            return false;
        }
        if let Some(author_id) = filter.author_id
            && post.author_id != author_id
        {
            return false;
        }
        if let Some(viewer) = filter.followed_by
            && !self
                .follows
                .values()
                .any(|edge| edge.user_id == viewer && edge.author_id == post.author_id)
        {
            return false;
        }
        true
    }
}

#[derive(Default)]
pub struct MemoryRepositories {
    state: RwLock<MemoryState>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UsersRepo for MemoryRepositories {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut state = self.write();
        if state
            .users
            .values()
            .any(|user| user.username == params.username)
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            created_at: OffsetDateTime::now_utc(),
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .read()
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.write();
        if state.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let doomed_posts: Vec<Uuid> = state
            .posts
            .values()
            .filter(|post| post.author_id == id)
            .map(|post| post.id)
            .collect();

        state
            .comments
            .retain(|_, comment| comment.author_id != id && !doomed_posts.contains(&comment.post_id));
        state
            .follows
            .retain(|_, edge| edge.user_id != id && edge.author_id != id);
        state.posts.retain(|_, post| post.author_id != id);

        Ok(())
    }
}

#[async_trait]
impl GroupsRepo for MemoryRepositories {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut state = self.write();
        if state.groups.values().any(|group| group.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "groups_slug_key".to_string(),
            });
        }

        let record = GroupRecord {
            id: Uuid::new_v4(),
            title: params.title,
            slug: params.slug,
            description: params.description,
            created_at: OffsetDateTime::now_utc(),
        };
        state.groups.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self.read().groups.get(&id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self
            .read()
            .groups
            .values()
            .find(|group| group.slug == slug)
            .cloned())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups: Vec<GroupRecord> = self.read().groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn delete_group(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.write();
        if state.groups.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        for post in state.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl PostsRepo for MemoryRepositories {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.read();
        let mut posts: Vec<PostRecord> = state
            .posts
            .values()
            .filter(|post| state.post_matches(post, filter))
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        if offset >= posts.len() {
            return Ok(Vec::new());
        }
        Ok(posts
            .into_iter()
            .skip(offset)
            .take(page.size() as usize)
            .collect())
    }

    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError> {
        let state = self.read();
        let count = state
            .posts
            .values()
            .filter(|post| state.post_matches(post, filter))
            .count();
        Ok(count as u64)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.read().posts.get(&id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.write();
        if !state.users.contains_key(&params.author_id) {
            return Err(RepoError::invalid_input("post references a missing user"));
        }
        if let Some(group_id) = params.group_id
            && !state.groups.contains_key(&group_id)
        {
            return Err(RepoError::invalid_input("post references a missing group"));
        }

        let record = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            text: params.text,
            author_id: params.author_id,
            group_id: params.group_id,
            image_path: params.image_path,
            created_at: OffsetDateTime::now_utc(),
        };
        state.posts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.write();
        if let Some(group_id) = params.group_id
            && !state.groups.contains_key(&group_id)
        {
            return Err(RepoError::invalid_input("post references a missing group"));
        }

        let post = state.posts.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        post.title = params.title;
        post.text = params.text;
        post.group_id = params.group_id;
        post.image_path = params.image_path;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.write();
        if state.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        state.comments.retain(|_, comment| comment.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = self.write();
        if !state.posts.contains_key(&params.post_id) {
            return Err(RepoError::invalid_input("comment references a missing post"));
        }
        if !state.users.contains_key(&params.author_id) {
            return Err(RepoError::invalid_input("comment references a missing user"));
        }

        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: params.author_id,
            text: params.text,
            created_at: OffsetDateTime::now_utc(),
        };
        state.comments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let mut comments: Vec<CommentRecord> = self
            .read()
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(comments)
    }
}

#[async_trait]
impl FollowsRepo for MemoryRepositories {
    async fn create_follow(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<FollowRecord, RepoError> {
        let mut state = self.write();
        if !state.users.contains_key(&user_id) || !state.users.contains_key(&author_id) {
            return Err(RepoError::invalid_input("follow references a missing user"));
        }
        if user_id == author_id {
            return Err(RepoError::integrity(
                "new row violates check constraint \"follows_no_self_follow\"",
            ));
        }
        if state
            .follows
            .values()
            .any(|edge| edge.user_id == user_id && edge.author_id == author_id)
        {
            return Err(RepoError::Duplicate {
                constraint: "follows_unique_edge".to_string(),
            });
        }

        let record = FollowRecord {
            id: Uuid::new_v4(),
            user_id,
            author_id,
            created_at: OffsetDateTime::now_utc(),
        };
        state.follows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut state = self.write();
        let doomed: Option<Uuid> = state
            .follows
            .values()
            .find(|edge| edge.user_id == user_id && edge.author_id == author_id)
            .map(|edge| edge.id);

        match doomed {
            Some(id) => {
                state.follows.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        Ok(self
            .read()
            .follows
            .values()
            .any(|edge| edge.user_id == user_id && edge.author_id == author_id))
    }
}

#[async_trait]
impl StoreHealth for MemoryRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
