//! Core business logic for the AI Builders social network.
//!
//! [`Services`] wires every service to one database connection, one change
//! feed and one image host:
//!
//! ```no_run
//! # async fn run() -> aibuilders_common::AppResult<()> {
//! use aibuilders_common::Config;
//! use aibuilders_core::{FeedFilter, Services};
//!
//! let config = Config::load()?;
//! let db = aibuilders_db::init(&config).await?;
//! let services = Services::new(std::sync::Arc::new(db), &config)?;
//!
//! let feed = services.feed.compose_feed("01j0000000000000000000000a", FeedFilter::All).await?;
//! # let _ = feed;
//! # Ok(())
//! # }
//! ```

pub mod services;

pub use services::*;

use std::sync::Arc;

use aibuilders_common::{AppResult, Config};
use aibuilders_db::repositories::{
    AccountRepository, CommentRepository, FollowRepository, MessageRepository, PostLikeRepository,
    PostRepository, ProfileRepository, SessionRepository,
};
use sea_orm::DatabaseConnection;

/// Every service, built over shared collaborators.
#[derive(Clone)]
#[allow(missing_docs)]
pub struct Services {
    pub accounts: AccountService,
    pub profiles: ProfileService,
    pub following: FollowingService,
    pub engagement: EngagementService,
    pub posts: PostService,
    pub feed: FeedService,
    pub messaging: MessagingService,
    pub media: MediaService,
    /// Shared by posts and messaging; subscribe here for post notices.
    pub change_feed: ChangeFeed,
}

impl Services {
    /// Build the services with the default identity gateway and the image
    /// host named in the configuration.
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> AppResult<Self> {
        let gateway = Arc::new(DbIdentityGateway::new(
            AccountRepository::new(Arc::clone(&db)),
            SessionRepository::new(Arc::clone(&db)),
            config.auth.session_ttl_hours,
        )?);
        let image_host = image_host_from_config(&config.media)?;
        Ok(Self::with_collaborators(db, config, gateway, image_host))
    }

    /// Build the services around caller-supplied collaborators.
    #[must_use]
    pub fn with_collaborators(
        db: Arc<DatabaseConnection>,
        config: &Config,
        gateway: Arc<dyn IdentityGateway>,
        image_host: Arc<dyn ImageHost>,
    ) -> Self {
        let change_feed = ChangeFeed::default();

        let profile_repo = ProfileRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));

        let profiles = ProfileService::new(profile_repo.clone(), config.search.clone());
        let following =
            FollowingService::new(FollowRepository::new(Arc::clone(&db)), profile_repo.clone());
        let engagement = EngagementService::new(
            post_repo.clone(),
            PostLikeRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            profile_repo.clone(),
        );
        let posts = PostService::new(post_repo.clone(), profile_repo.clone(), change_feed.clone());
        let feed = FeedService::new(
            post_repo,
            profile_repo.clone(),
            following.clone(),
            engagement.clone(),
            config.feed.include_own_posts_in_following,
        );
        let messaging = MessagingService::new(
            MessageRepository::new(db),
            profile_repo,
            change_feed.clone(),
        );

        Self {
            accounts: AccountService::new(gateway, profiles.clone()),
            profiles,
            following,
            engagement,
            posts,
            feed,
            messaging,
            media: MediaService::new(image_host, config.media.max_upload_bytes),
            change_feed,
        }
    }
}
