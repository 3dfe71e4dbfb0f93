//! Engagement service: likes and comment threads.

use std::collections::{HashMap, HashSet};

use aibuilders_common::{AppError, AppResult, IdGenerator};
use aibuilders_db::{
    entities::{comment, post_like, profile},
    repositories::{CommentRepository, PostLikeRepository, PostRepository, ProfileRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use validator::Validate;

/// Engagement service for business logic.
#[derive(Clone)]
pub struct EngagementService {
    post_repo: PostRepository,
    like_repo: PostLikeRepository,
    comment_repo: CommentRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

#[derive(Debug, Validate)]
struct CommentContent<'a> {
    #[validate(length(min = 1, max = 2000))]
    content: &'a str,
}

/// A comment together with its author's profile.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comment::Model,
    /// `None` when the author has no profile.
    pub author: Option<profile::Model>,
}

impl EngagementService {
    /// Create a new engagement service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        like_repo: PostLikeRepository,
        comment_repo: CommentRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            post_repo,
            like_repo,
            comment_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn ensure_post_exists(&self, post_id: &str) -> AppResult<()> {
        if self.post_repo.exists(post_id).await? {
            Ok(())
        } else {
            Err(AppError::PostNotFound(post_id.to_string()))
        }
    }

    /// Flip the user's like on a post. Returns the new state.
    ///
    /// Two sessions toggling at once race; the last write wins.
    pub async fn toggle_like(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        self.ensure_post_exists(post_id).await?;
        // Likes hang off the profile, not the identity
        self.profile_repo.get_by_id(user_id).await?;

        if self.like_repo.find_by_pair(user_id, post_id).await?.is_some() {
            self.like_repo.delete_by_pair(user_id, post_id).await?;
            tracing::info!(user_id = %user_id, post_id = %post_id, "Post unliked");
            return Ok(false);
        }

        let model = post_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match self.like_repo.create(model).await {
            Ok(_) => {
                tracing::info!(user_id = %user_id, post_id = %post_id, "Post liked");
                Ok(true)
            }
            Err(AppError::Conflict(_)) => {
                tracing::debug!(user_id = %user_id, post_id = %post_id, "Like already recorded");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Number of likes on a post.
    pub async fn like_count(&self, post_id: &str) -> AppResult<u64> {
        self.like_repo.count_by_post(post_id).await
    }

    /// Whether the user has liked a post.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        Ok(self.like_repo.find_by_pair(user_id, post_id).await?.is_some())
    }

    /// Like counts for several posts. Posts without likes map to zero.
    pub async fn like_counts(&self, post_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        let counts = self.like_repo.count_by_posts(post_ids).await?;
        Ok(fill_zero(post_ids, counts))
    }

    /// Which of `post_ids` the user has liked.
    pub async fn liked_posts(
        &self,
        user_id: &str,
        post_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        self.like_repo.liked_post_ids(user_id, post_ids).await
    }

    /// Append a comment to a post. Content is stored trimmed.
    pub async fn add_comment(
        &self,
        user_id: &str,
        post_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Comment cannot be empty".to_string()));
        }
        CommentContent { content }.validate()?;

        self.ensure_post_exists(post_id).await?;
        self.profile_repo.get_by_id(user_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            author_id: Set(user_id.to_string()),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(comment_id = %comment.id, post_id = %post_id, "Comment added");
        Ok(comment)
    }

    /// Comments on a post, oldest first, with their authors.
    pub async fn list_comments(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;
        if comments.is_empty() {
            return Ok(vec![]);
        }

        let author_ids: Vec<String> = comments
            .iter()
            .map(|c| c.author_id.clone())
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

        Ok(comments
            .into_iter()
            .map(|comment| {
                let author = authors.get(&comment.author_id).cloned();
                CommentView { comment, author }
            })
            .collect())
    }

    /// Number of comments on a post.
    pub async fn comment_count(&self, post_id: &str) -> AppResult<u64> {
        self.comment_repo.count_by_post(post_id).await
    }

    /// Comment counts for several posts. Posts without comments map to zero.
    pub async fn comment_counts(&self, post_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        let counts = self.comment_repo.count_by_posts(post_ids).await?;
        Ok(fill_zero(post_ids, counts))
    }
}

fn fill_zero(post_ids: &[String], mut counts: HashMap<String, u64>) -> HashMap<String, u64> {
    for id in post_ids {
        counts.entry(id.clone()).or_insert(0);
    }
    counts
}
