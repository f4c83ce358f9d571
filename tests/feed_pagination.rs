//! Feed assembly tests: the four listing modes and their pagination.

use std::collections::HashSet;
use std::sync::Arc;

use brusio::application::feed::{FeedError, FeedService};
use brusio::application::repos::{
    CreateGroupParams, CreatePostParams, CreateUserParams, FollowsRepo, GroupsRepo, PostsWriteRepo,
    UsersRepo,
};
use brusio::domain::entities::UserRecord;
use brusio::infra::memory::MemoryRepositories;
use uuid::Uuid;

const PAGE_SIZE: u32 = 10;

fn service(store: &Arc<MemoryRepositories>) -> FeedService {
    FeedService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        PAGE_SIZE,
    )
}

async fn user(store: &MemoryRepositories, username: &str) -> UserRecord {
    store
        .create_user(CreateUserParams {
            username: username.to_string(),
        })
        .await
        .expect("user created")
}

async fn seed_posts(store: &MemoryRepositories, author: Uuid, group: Option<Uuid>, count: usize) {
    for index in 0..count {
        store
            .create_post(CreatePostParams {
                title: format!("post {index}"),
                text: "body".to_string(),
                author_id: author,
                group_id: group,
                image_path: None,
            })
            .await
            .expect("post created");
    }
}

#[tokio::test]
async fn one_hundred_twenty_three_posts_paginate_in_tens() {
    let store = Arc::new(MemoryRepositories::new());
    let author = user(&store, "prolific").await;
    seed_posts(&store, author.id, None, 123).await;

    let feed = service(&store);

    let first = feed.global(Some(1)).await.expect("first page");
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_items, 123);
    assert_eq!(first.total_pages, 13);
    assert!(first.has_next);
    assert!(!first.has_previous);

    let last = feed.global(Some(13)).await.expect("last page");
    assert_eq!(last.items.len(), 3);
    assert!(!last.has_next);
    assert!(last.has_previous);

    let beyond = feed.global(Some(14)).await.expect("page past the end");
    assert!(beyond.items.is_empty());
}

#[tokio::test]
async fn pages_partition_the_feed_without_overlap() {
    let store = Arc::new(MemoryRepositories::new());
    let author = user(&store, "prolific").await;
    seed_posts(&store, author.id, None, 123).await;

    let feed = service(&store);
    let mut seen: HashSet<Uuid> = HashSet::new();
    for number in 1..=13 {
        let page = feed.global(Some(number)).await.expect("page");
        for item in &page.items {
            assert!(seen.insert(item.id), "post listed on two pages");
        }
    }
    assert_eq!(seen.len(), 123);
}

#[tokio::test]
async fn zero_and_negative_page_numbers_read_as_page_one() {
    let store = Arc::new(MemoryRepositories::new());
    let author = user(&store, "author").await;
    seed_posts(&store, author.id, None, 15).await;

    let feed = service(&store);
    let first = feed.global(Some(1)).await.expect("page one");
    let zero = feed.global(Some(0)).await.expect("page zero");
    let negative = feed.global(Some(-2)).await.expect("negative page");

    assert_eq!(zero.page_number, 1);
    assert_eq!(negative.page_number, 1);
    let ids = |page: &brusio::application::pagination::Page<brusio::domain::entities::PostRecord>| {
        page.items.iter().map(|post| post.id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&zero), ids(&first));
    assert_eq!(ids(&negative), ids(&first));
}

#[tokio::test]
async fn global_feed_is_ordered_newest_first() {
    let store = Arc::new(MemoryRepositories::new());
    let author = user(&store, "author").await;
    seed_posts(&store, author.id, None, 25).await;

    let feed = service(&store);
    let page = feed.global(Some(1)).await.expect("page");
    for pair in page.items.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn following_feed_matches_the_follow_set() {
    let store = Arc::new(MemoryRepositories::new());
    let viewer = user(&store, "viewer").await;
    let liked = user(&store, "liked").await;
    let also_liked = user(&store, "also-liked").await;
    let ignored = user(&store, "ignored").await;

    seed_posts(&store, liked.id, None, 3).await;
    seed_posts(&store, also_liked.id, None, 2).await;
    seed_posts(&store, ignored.id, None, 4).await;

    store
        .create_follow(viewer.id, liked.id)
        .await
        .expect("follow");
    store
        .create_follow(viewer.id, also_liked.id)
        .await
        .expect("follow");

    let feed = service(&store);
    let page = feed.following(viewer.id, Some(1)).await.expect("feed");
    assert_eq!(page.total_items, 5);
    assert!(
        page.items
            .iter()
            .all(|post| post.author_id == liked.id || post.author_id == also_liked.id)
    );
}

#[tokio::test]
async fn empty_follow_set_yields_an_empty_page() {
    let store = Arc::new(MemoryRepositories::new());
    let viewer = user(&store, "viewer").await;
    let other = user(&store, "other").await;
    seed_posts(&store, other.id, None, 5).await;

    let feed = service(&store);
    let page = feed.following(viewer.id, None).await.expect("feed");
    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 0);
}

#[tokio::test]
async fn group_feed_filters_to_the_group() {
    let store = Arc::new(MemoryRepositories::new());
    let author = user(&store, "author").await;
    let club = store
        .create_group(CreateGroupParams {
            title: "Club".to_string(),
            slug: "club".to_string(),
            description: "a club".to_string(),
        })
        .await
        .expect("group");

    seed_posts(&store, author.id, Some(club.id), 4).await;
    seed_posts(&store, author.id, None, 3).await;

    let feed = service(&store);
    let result = feed.group("club", None).await.expect("group feed");
    assert_eq!(result.group.id, club.id);
    assert_eq!(result.page.total_items, 4);
    assert!(
        result
            .page
            .items
            .iter()
            .all(|post| post.group_id == Some(club.id))
    );
}

#[tokio::test]
async fn unknown_group_slug_is_not_found() {
    let store = Arc::new(MemoryRepositories::new());
    let feed = service(&store);
    let err = feed.group("no-such-club", None).await.expect_err("missing slug");
    assert!(matches!(err, FeedError::UnknownGroup));
}

#[tokio::test]
async fn profile_feed_reports_count_and_follow_state() {
    let store = Arc::new(MemoryRepositories::new());
    let author = user(&store, "author").await;
    let fan = user(&store, "fan").await;
    let stranger = user(&store, "stranger").await;
    seed_posts(&store, author.id, None, 7).await;
    store
        .create_follow(fan.id, author.id)
        .await
        .expect("follow");

    let feed = service(&store);

    let seen_by_fan = feed
        .profile("author", Some(fan.id), None)
        .await
        .expect("profile");
    assert_eq!(seen_by_fan.total_posts, 7);
    assert!(seen_by_fan.viewer_follows);

    let seen_by_stranger = feed
        .profile("author", Some(stranger.id), None)
        .await
        .expect("profile");
    assert!(!seen_by_stranger.viewer_follows);

    let seen_anonymously = feed.profile("author", None, None).await.expect("profile");
    assert!(!seen_anonymously.viewer_follows);
}

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let store = Arc::new(MemoryRepositories::new());
    let feed = service(&store);
    let err = feed
        .profile("nobody", None, None)
        .await
        .expect_err("missing author");
    assert!(matches!(err, FeedError::UnknownAuthor));
}
