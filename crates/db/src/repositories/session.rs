//! Session repository.

use std::sync::Arc;

use crate::db_error;
use crate::entities::{Session, session};
use aibuilders_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Session repository for database operations.
#[derive(Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a session by token, ignoring expiry.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<session::Model>> {
        Session::find_by_id(token)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a session by token if it has not expired yet.
    pub async fn find_active(&self, token: &str) -> AppResult<Option<session::Model>> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        Session::find_by_id(token)
            .filter(session::Column::ExpiresAt.gt(now))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new session.
    pub async fn create(&self, model: session::ActiveModel) -> AppResult<session::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_error)
    }

    /// Delete a session. Returns whether a row was removed.
    pub async fn delete_by_token(&self, token: &str) -> AppResult<bool> {
        let result = Session::delete_by_id(token)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Delete every expired session. Returns the number removed.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Session::delete_many()
            .filter(session::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
