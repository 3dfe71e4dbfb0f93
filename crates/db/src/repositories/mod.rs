//! Database repositories.

mod account;
mod comment;
mod follow;
mod message;
mod post;
mod post_like;
mod profile;
mod session;

pub use account::AccountRepository;
pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use message::MessageRepository;
pub use post::PostRepository;
pub use post_like::PostLikeRepository;
pub use profile::ProfileRepository;
pub use session::SessionRepository;
