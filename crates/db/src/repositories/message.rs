//! Direct message repository.

use std::sync::Arc;

use crate::db_error;
use crate::entities::{Message, message};
use aibuilders_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_error)
    }

    /// Messages exchanged between two users in either direction, oldest first.
    pub async fn find_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Vec<message::Model>> {
        let condition = Condition::any()
            .add(
                Condition::all()
                    .add(message::Column::SenderId.eq(user_a))
                    .add(message::Column::RecipientId.eq(user_b)),
            )
            .add(
                Condition::all()
                    .add(message::Column::SenderId.eq(user_b))
                    .add(message::Column::RecipientId.eq(user_a)),
            );

        Message::find()
            .filter(condition)
            .order_by_asc(message::Column::CreatedAt)
            .order_by_asc(message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every message a user sent or received, newest first.
    pub async fn find_involving(&self, user_id: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(
                Condition::any()
                    .add(message::Column::SenderId.eq(user_id))
                    .add(message::Column::RecipientId.eq(user_id)),
            )
            .order_by_desc(message::Column::CreatedAt)
            .order_by_desc(message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
