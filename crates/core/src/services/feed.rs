//! Feed composition.
//!
//! Every call recomposes the feed from storage; nothing is cached between
//! calls.

use std::collections::{HashMap, HashSet};

use aibuilders_common::{AppError, AppResult};
use aibuilders_db::{
    entities::{post, profile},
    repositories::{PostRepository, ProfileRepository},
};
use serde::{Deserialize, Serialize};

use crate::services::engagement::EngagementService;
use crate::services::following::FollowingService;

/// Which posts a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFilter {
    /// Every post.
    #[default]
    All,
    /// Posts by profiles the viewer follows.
    Following,
}

/// A post enriched for display.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: post::Model,
    /// `None` when the author has no profile ("unknown user").
    pub author: Option<profile::Model>,
    pub like_count: u64,
    pub has_liked: bool,
    pub comment_count: u64,
}

/// Feed service.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    profile_repo: ProfileRepository,
    following: FollowingService,
    engagement: EngagementService,
    include_own_posts_in_following: bool,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        profile_repo: ProfileRepository,
        following: FollowingService,
        engagement: EngagementService,
        include_own_posts_in_following: bool,
    ) -> Self {
        Self {
            post_repo,
            profile_repo,
            following,
            engagement,
            include_own_posts_in_following,
        }
    }

    /// Compose the feed for `viewer_id`, newest first.
    pub async fn compose_feed(
        &self,
        viewer_id: &str,
        filter: FeedFilter,
    ) -> AppResult<Vec<PostView>> {
        let posts = match filter {
            FeedFilter::All => self.post_repo.find_all_newest_first().await?,
            FeedFilter::Following => {
                let mut authors = self.following.list_following(viewer_id).await?;
                if self.include_own_posts_in_following {
                    authors.insert(viewer_id.to_string());
                } else {
                    authors.remove(viewer_id);
                }
                let authors: Vec<String> = authors.into_iter().collect();
                self.post_repo.find_by_authors(&authors).await?
            }
        };

        tracing::debug!(viewer_id = %viewer_id, ?filter, posts = posts.len(), "Composing feed");
        self.enrich(Some(viewer_id), posts).await
    }

    /// Posts on one profile page, newest first.
    ///
    /// Anonymous viewers see `has_liked = false` everywhere.
    pub async fn profile_posts(
        &self,
        viewer_id: Option<&str>,
        username: &str,
    ) -> AppResult<Vec<PostView>> {
        let profile = self
            .profile_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        let posts = self.post_repo.find_by_author(&profile.id).await?;
        self.enrich(viewer_id, posts).await
    }

    async fn enrich(
        &self,
        viewer_id: Option<&str>,
        posts: Vec<post::Model>,
    ) -> AppResult<Vec<PostView>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let author_ids: Vec<String> = posts
            .iter()
            .map(|p| p.author_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<String, profile::Model> = self
            .profile_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let like_counts = self.engagement.like_counts(&post_ids).await?;
        let comment_counts = self.engagement.comment_counts(&post_ids).await?;
        let liked = match viewer_id {
            Some(viewer) => self.engagement.liked_posts(viewer, &post_ids).await?,
            None => HashSet::new(),
        };

        Ok(posts
            .into_iter()
            .map(|post| PostView {
                author: authors.get(&post.author_id).cloned(),
                like_count: like_counts.get(&post.id).copied().unwrap_or(0),
                has_liked: liked.contains(&post.id),
                comment_count: comment_counts.get(&post.id).copied().unwrap_or(0),
                post,
            })
            .collect())
    }
}
