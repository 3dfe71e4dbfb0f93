//! Social graph service.

use std::collections::HashSet;

use aibuilders_common::{AppError, AppResult, IdGenerator};
use aibuilders_db::{
    entities::follow,
    repositories::{FollowRepository, ProfileRepository},
};
use chrono::Utc;
use sea_orm::Set;

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    follow_repo: FollowRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, profile_repo: ProfileRepository) -> Self {
        Self {
            follow_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a profile.
    ///
    /// Following someone twice is not an error: the existing edge is returned.
    pub async fn follow(&self, follower_id: &str, target_id: &str) -> AppResult<follow::Model> {
        // Can't follow yourself
        if follower_id == target_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        self.profile_repo.get_by_id(follower_id).await?;
        self.profile_repo.get_by_id(target_id).await?;

        if let Some(existing) = self.follow_repo.find_by_pair(follower_id, target_id).await? {
            tracing::debug!(follower_id = %follower_id, target_id = %target_id, "Already following");
            return Ok(existing);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            following_id: Set(target_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match self.follow_repo.create(model).await {
            Ok(edge) => {
                tracing::info!(follower_id = %follower_id, target_id = %target_id, "Followed");
                Ok(edge)
            }
            // Another session inserted the same edge first.
            Err(AppError::Conflict(detail)) => self
                .follow_repo
                .find_by_pair(follower_id, target_id)
                .await?
                .ok_or(AppError::Conflict(detail)),
            Err(e) => Err(e),
        }
    }

    /// Unfollow a profile. Returns whether an edge was removed.
    pub async fn unfollow(&self, follower_id: &str, target_id: &str) -> AppResult<bool> {
        let removed = self.follow_repo.delete_by_pair(follower_id, target_id).await?;
        if removed {
            tracing::info!(follower_id = %follower_id, target_id = %target_id, "Unfollowed");
        } else {
            tracing::debug!(follower_id = %follower_id, target_id = %target_id, "Unfollow was a no-op");
        }
        Ok(removed)
    }

    /// Check if `follower_id` follows `target_id`.
    pub async fn is_following(&self, follower_id: &str, target_id: &str) -> AppResult<bool> {
        self.follow_repo.is_following(follower_id, target_id).await
    }

    /// Number of profiles following `profile_id`.
    pub async fn follower_count(&self, profile_id: &str) -> AppResult<u64> {
        self.follow_repo.count_followers(profile_id).await
    }

    /// Number of profiles `profile_id` follows.
    pub async fn following_count(&self, profile_id: &str) -> AppResult<u64> {
        self.follow_repo.count_following(profile_id).await
    }

    /// IDs of every profile `profile_id` follows.
    pub async fn list_following(&self, profile_id: &str) -> AppResult<HashSet<String>> {
        Ok(self
            .follow_repo
            .following_ids(profile_id)
            .await?
            .into_iter()
            .collect())
    }

    /// IDs of every profile following `profile_id`.
    pub async fn list_followers(&self, profile_id: &str) -> AppResult<HashSet<String>> {
        Ok(self
            .follow_repo
            .follower_ids(profile_id)
            .await?
            .into_iter()
            .collect())
    }
}
