//! Profile directory service.

use aibuilders_common::{AppError, AppResult, config::SearchConfig};
use aibuilders_db::{entities::profile, repositories::ProfileRepository};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::media::normalize_hosted_url;

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 32;

/// Profile directory service for business logic.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
    search: SearchConfig,
}

/// Input for creating a profile.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProfileInput {
    #[validate(length(min = 1, max = 32))]
    pub username: String,

    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
}

/// Input for updating a profile. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 32))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub display_name: Option<String>,

    /// An empty bio clears it.
    #[validate(length(max = 500))]
    pub bio: Option<String>,

    /// An empty URL clears the avatar.
    #[validate(length(max = 1024))]
    pub avatar_url: Option<String>,
}

/// Trim and lowercase a username.
#[must_use]
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Check a normalized username against the allowed alphabet.
pub fn check_username(username: &str) -> AppResult<()> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "Username must be 1-{MAX_USERNAME_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(AppError::Validation(
            "Username may only contain letters, digits and underscores".to_string(),
        ));
    }
    Ok(())
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository, search: SearchConfig) -> Self {
        Self {
            profile_repo,
            search,
        }
    }

    /// Fail with `Conflict` when the username is already held.
    pub async fn ensure_username_available(&self, username: &str) -> AppResult<()> {
        let username = normalize_username(username);
        check_username(&username)?;

        if self.profile_repo.username_exists(&username).await? {
            return Err(AppError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }
        Ok(())
    }

    /// Create the profile owned by `identity_id`.
    pub async fn create_profile(
        &self,
        identity_id: &str,
        input: CreateProfileInput,
    ) -> AppResult<profile::Model> {
        let input = CreateProfileInput {
            username: normalize_username(&input.username),
            display_name: input.display_name.trim().to_string(),
        };
        input.validate()?;
        self.ensure_username_available(&input.username).await?;

        let model = profile::ActiveModel {
            id: Set(identity_id.to_string()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username),
            display_name: Set(input.display_name),
            bio: Set(None),
            avatar_url: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let profile = self.profile_repo.create(model).await?;
        tracing::info!(profile_id = %profile.id, username = %profile.username, "Profile created");
        Ok(profile)
    }

    /// Get a profile by identity.
    pub async fn get_profile(&self, identity_id: &str) -> AppResult<profile::Model> {
        self.profile_repo.get_by_id(identity_id).await
    }

    /// Get a profile by username, ignoring case.
    pub async fn get_profile_by_username(&self, username: &str) -> AppResult<profile::Model> {
        self.profile_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// Update the profile owned by `identity_id`.
    pub async fn update_profile(
        &self,
        identity_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<profile::Model> {
        let input = UpdateProfileInput {
            username: input.username.as_deref().map(normalize_username),
            display_name: input.display_name.map(|d| d.trim().to_string()),
            bio: input.bio.map(|b| b.trim().to_string()),
            avatar_url: input.avatar_url,
        };
        input.validate()?;

        let profile = self.profile_repo.get_by_id(identity_id).await?;
        let mut active: profile::ActiveModel = profile.clone().into();

        if let Some(username) = input.username
            && username != profile.username_lower
        {
            check_username(&username)?;
            if let Some(holder) = self.profile_repo.find_by_username(&username).await?
                && holder.id != identity_id
            {
                return Err(AppError::Conflict(format!(
                    "Username '{username}' is already taken"
                )));
            }
            active.username = Set(username.clone());
            active.username_lower = Set(username);
        }

        if let Some(display_name) = input.display_name {
            active.display_name = Set(display_name);
        }

        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio).filter(|b| !b.is_empty()));
        }

        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(normalize_hosted_url(&avatar_url)?);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.profile_repo.update(active).await?;
        tracing::info!(profile_id = %updated.id, "Profile updated");
        Ok(updated)
    }

    /// Find profiles whose username or display name contains `query`,
    /// ignoring case.
    ///
    /// A blank query matches nothing. `limit` defaults to the configured
    /// search size and is clamped to the configured maximum.
    pub async fn search_profiles(
        &self,
        query: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<profile::Model>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let limit = limit
            .unwrap_or(self.search.default_limit)
            .clamp(1, self.search.max_limit.max(1));

        let profiles = self.profile_repo.search(query, limit).await?;
        tracing::debug!(query = %query, found = profiles.len(), "Profile search");
        Ok(profiles)
    }
}
