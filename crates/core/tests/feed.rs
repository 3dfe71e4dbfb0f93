//! Feed composition against a migrated database.

#![allow(clippy::unwrap_used)]

mod common;

use aibuilders_common::{AppError, Config};
use aibuilders_core::FeedFilter;

#[tokio::test]
async fn following_feed_shows_followed_authors_only() {
    let h = common::harness().await;
    let alice = h.seed_user("alice").await;
    let bob = h.seed_user("bob").await;
    let carol = h.seed_user("carol").await;

    h.services.following.follow(&alice, &bob).await.unwrap();
    let bob_post = h.seed_post(&bob, "from bob").await;
    let carol_post = h.seed_post(&carol, "from carol").await;
    let alice_post = h.seed_post(&alice, "from alice").await;

    let feed = h
        .services
        .feed
        .compose_feed(&alice, FeedFilter::Following)
        .await
        .unwrap();
    let ids: Vec<_> = feed.iter().map(|v| v.post.id.clone()).collect();

    assert!(ids.contains(&bob_post));
    assert!(!ids.contains(&carol_post));
    assert!(!ids.contains(&alice_post));
}

#[tokio::test]
async fn following_feed_can_include_own_posts() {
    let mut config = Config::with_database_url("sqlite::memory:");
    config.feed.include_own_posts_in_following = true;
    let h = common::harness_with(config).await;
    let alice = h.seed_user("alice").await;
    let alice_post = h.seed_post(&alice, "mine").await;

    let feed = h
        .services
        .feed
        .compose_feed(&alice, FeedFilter::Following)
        .await
        .unwrap();

    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].post.id, alice_post);
}

#[tokio::test]
async fn all_feed_is_newest_first_and_enriched() {
    let h = common::harness().await;
    let alice = h.seed_user("alice").await;
    let bob = h.seed_user("bob").await;

    let older = h.seed_post(&bob, "older").await;
    let newer = h.seed_post(&alice, "newer").await;
    h.services.engagement.toggle_like(&alice, &older).await.unwrap();
    h.services.engagement.toggle_like(&bob, &older).await.unwrap();
    h.services
        .engagement
        .add_comment(&alice, &older, "nice")
        .await
        .unwrap();

    let feed = h
        .services
        .feed
        .compose_feed(&alice, FeedFilter::All)
        .await
        .unwrap();

    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].post.id, newer);
    assert_eq!(feed[0].like_count, 0);
    assert!(!feed[0].has_liked);
    assert_eq!(feed[0].comment_count, 0);

    assert_eq!(feed[1].post.id, older);
    assert_eq!(feed[1].like_count, 2);
    assert!(feed[1].has_liked);
    assert_eq!(feed[1].comment_count, 1);
    assert_eq!(
        feed[1].author.as_ref().map(|a| a.username.as_str()),
        Some("bob")
    );
}

#[tokio::test]
async fn profile_posts_for_anonymous_viewer() {
    let h = common::harness().await;
    let alice = h.seed_user("alice").await;
    let bob = h.seed_user("bob").await;
    let post = h.seed_post(&bob, "hello").await;
    h.seed_post(&alice, "not on bob's page").await;
    h.services.engagement.toggle_like(&alice, &post).await.unwrap();

    let anonymous = h.services.feed.profile_posts(None, "BOB").await.unwrap();
    assert_eq!(anonymous.len(), 1);
    assert_eq!(anonymous[0].like_count, 1);
    assert!(!anonymous[0].has_liked);

    let as_alice = h
        .services
        .feed
        .profile_posts(Some(&alice), "bob")
        .await
        .unwrap();
    assert!(as_alice[0].has_liked);

    assert!(matches!(
        h.services.feed.profile_posts(None, "nobody").await,
        Err(AppError::UserNotFound(_))
    ));
}
