//! Messaging service for direct messages.

use std::collections::{HashMap, HashSet};

use aibuilders_common::{AppError, AppResult, IdGenerator};
use aibuilders_db::{
    entities::{message, profile},
    repositories::{MessageRepository, ProfileRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use validator::Validate;

use crate::services::change_feed::{ChangeFeed, MessageSubscription, Table};

/// Latest message with one counterpart. Derived on every read.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub counterpart_id: String,
    /// `None` when the counterpart has no profile.
    pub counterpart: Option<profile::Model>,
    pub last_message: message::Model,
}

#[derive(Debug, Validate)]
struct MessageContent<'a> {
    #[validate(length(min = 1, max = 5000))]
    content: &'a str,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    profile_repo: ProfileRepository,
    change_feed: ChangeFeed,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        profile_repo: ProfileRepository,
        change_feed: ChangeFeed,
    ) -> Self {
        Self {
            message_repo,
            profile_repo,
            change_feed,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a message to another user.
    pub async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> AppResult<message::Model> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }
        MessageContent { content }.validate()?;

        // Check that sender is not trying to message themselves
        if sender_id == recipient_id {
            return Err(AppError::BadRequest(
                "Cannot send a message to yourself".to_string(),
            ));
        }

        // Check that recipient exists
        self.profile_repo.get_by_id(recipient_id).await?;

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender_id.to_string()),
            recipient_id: Set(recipient_id.to_string()),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let message = self.message_repo.create(model).await?;
        tracing::info!(
            message_id = %message.id,
            sender_id = %sender_id,
            recipient_id = %recipient_id,
            "Message sent"
        );

        self.change_feed.publish_insert(
            Table::Message,
            &message.id,
            vec![sender_id.to_string(), recipient_id.to_string()],
        );

        Ok(message)
    }

    /// The thread between two users, oldest first.
    pub async fn list_messages(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Vec<message::Model>> {
        self.message_repo.find_between(user_a, user_b).await
    }

    /// One summary per counterpart, most recent conversation first.
    pub async fn list_conversations(&self, user_id: &str) -> AppResult<Vec<ConversationSummary>> {
        let messages = self.message_repo.find_involving(user_id).await?;

        // Messages arrive newest first, so the first one per counterpart wins.
        let mut seen = HashSet::new();
        let latest: Vec<message::Model> = messages
            .into_iter()
            .filter(|m| seen.insert(m.counterpart_of(user_id).to_string()))
            .collect();

        let counterpart_ids: Vec<String> = seen.into_iter().collect();
        let profiles: HashMap<String, profile::Model> = self
            .profile_repo
            .find_by_ids(&counterpart_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(latest
            .into_iter()
            .map(|last_message| {
                let counterpart_id = last_message.counterpart_of(user_id).to_string();
                ConversationSummary {
                    counterpart: profiles.get(&counterpart_id).cloned(),
                    counterpart_id,
                    last_message,
                }
            })
            .collect())
    }

    /// Watch for new messages sent to or by `user_id`.
    ///
    /// Notices only say that something changed; re-read the thread to see it.
    #[must_use]
    pub fn subscribe(&self, user_id: &str) -> MessageSubscription {
        tracing::debug!(user_id = %user_id, "Message subscription opened");
        self.change_feed.subscribe_for(Table::Message, user_id)
    }
}
