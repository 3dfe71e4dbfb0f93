//! Post authoring service.

use aibuilders_common::{AppError, AppResult, IdGenerator};
use aibuilders_db::{
    entities::post,
    repositories::{PostRepository, ProfileRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::change_feed::{ChangeFeed, Table};
use crate::services::media::normalize_hosted_url;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    profile_repo: ProfileRepository,
    change_feed: ChangeFeed,
    id_gen: IdGenerator,
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,

    /// Hosted image URL. Blank means no image.
    #[validate(length(max = 1024))]
    pub image_url: Option<String>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        profile_repo: ProfileRepository,
        change_feed: ChangeFeed,
    ) -> Self {
        Self {
            post_repo,
            profile_repo,
            change_feed,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a post.
    pub async fn create_post(
        &self,
        author_id: &str,
        input: CreatePostInput,
    ) -> AppResult<post::Model> {
        let input = CreatePostInput {
            content: input.content.trim().to_string(),
            image_url: input.image_url,
        };
        if input.content.is_empty() {
            return Err(AppError::Validation("Post cannot be empty".to_string()));
        }
        input.validate()?;

        let image_url = match input.image_url.as_deref() {
            Some(raw) => normalize_hosted_url(raw)?,
            None => None,
        };

        // Authors must have a profile
        self.profile_repo.get_by_id(author_id).await?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            content: Set(input.content),
            image_url: Set(image_url),
            created_at: Set(Utc::now().into()),
        };

        let post = self.post_repo.create(model).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");

        self.change_feed.publish_insert(Table::Post, &post.id, vec![]);

        Ok(post)
    }

    /// Get a post by ID.
    pub async fn get_post(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// Posts by one author, newest first.
    pub async fn list_by_author(&self, author_id: &str) -> AppResult<Vec<post::Model>> {
        self.post_repo.find_by_author(author_id).await
    }
}
