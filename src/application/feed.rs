//! Feed assembly: the four public post listings.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{
    FollowsRepo, GroupsRepo, PostQueryFilter, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Group feed: the group header plus one page of its posts.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: Page<PostRecord>,
}

/// Profile feed: the author, one page of their posts, their total post
/// count, and whether the current viewer already follows them.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: UserRecord,
    pub page: Page<PostRecord>,
    pub total_posts: u64,
    pub viewer_follows: bool,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        follows: Arc<dyn FollowsRepo>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
            page_size: page_size.max(1),
        }
    }

    pub fn page_request(&self, number: Option<i64>) -> PageRequest {
        PageRequest::from_query(number, self.page_size)
    }

    /// All posts, any author, any group.
    pub async fn global(&self, page: Option<i64>) -> Result<Page<PostRecord>, FeedError> {
        self.assemble(&PostQueryFilter::default(), self.page_request(page))
            .await
    }

    /// Posts belonging to the group resolved from `slug`.
    pub async fn group(&self, slug: &str, page: Option<i64>) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;

        let page = self
            .assemble(&PostQueryFilter::for_group(group.id), self.page_request(page))
            .await?;

        Ok(GroupFeed { group, page })
    }

    /// Posts authored by `username`, with follow-affordance data for the
    /// viewer (anonymous viewers never follow anyone).
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        page: Option<i64>,
    ) -> Result<ProfileFeed, FeedError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;

        let page = self
            .assemble(
                &PostQueryFilter::for_author(author.id),
                self.page_request(page),
            )
            .await?;

        let viewer_follows = match viewer {
            Some(viewer) if viewer != author.id => {
                self.follows.follow_exists(viewer, author.id).await?
            }
            _ => false,
        };

        let total_posts = page.total_items;
        Ok(ProfileFeed {
            author,
            page,
            total_posts,
            viewer_follows,
        })
    }

    /// Posts whose author the viewer follows; an empty follow set yields an
    /// empty page, not an error.
    pub async fn following(
        &self,
        viewer: Uuid,
        page: Option<i64>,
    ) -> Result<Page<PostRecord>, FeedError> {
        self.assemble(&PostQueryFilter::followed_by(viewer), self.page_request(page))
            .await
    }

    async fn assemble(
        &self,
        filter: &PostQueryFilter,
        request: PageRequest,
    ) -> Result<Page<PostRecord>, FeedError> {
        let total = self.posts.count_posts(filter).await?;
        let items = self.posts.list_posts(filter, request).await?;
        Ok(Page::assemble(items, request, total))
    }
}
