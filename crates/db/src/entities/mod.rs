//! Database entities.

#![allow(missing_docs)]

pub mod account;
pub mod comment;
pub mod follow;
pub mod message;
pub mod post;
pub mod post_like;
pub mod profile;
pub mod session;

pub use account::Entity as Account;
pub use comment::Entity as Comment;
pub use follow::Entity as Follow;
pub use message::Entity as Message;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use profile::Entity as Profile;
pub use session::Entity as Session;
