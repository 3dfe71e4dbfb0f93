//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod change_feed;
pub mod engagement;
pub mod feed;
pub mod following;
pub mod identity;
pub mod media;
pub mod messaging;
pub mod post;
pub mod profile;

pub use account::{AccountService, Registration, SignUpInput};
pub use change_feed::{
    ChangeFeed, ChangeNotice, ChangeOperation, MessageSubscription, Subscription, Table,
};
pub use engagement::{CommentView, EngagementService};
pub use feed::{FeedFilter, FeedService, PostView};
pub use following::FollowingService;
pub use identity::{DbIdentityGateway, Identity, IdentityGateway, Session};
pub use media::{
    CloudinaryImageHost, HostedImage, ImageHost, LocalImageHost, MediaService, UploadImage,
    image_host_from_config, normalize_hosted_url,
};
pub use messaging::{ConversationSummary, MessagingService};
pub use post::{CreatePostInput, PostService};
pub use profile::{CreateProfileInput, ProfileService, UpdateProfileInput};
