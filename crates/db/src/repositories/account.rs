//! Account repository.

use std::sync::Arc;

use crate::db_error;
use crate::entities::{Account, account};
use aibuilders_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Account repository for database operations.
#[derive(Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an account by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<account::Model>> {
        Account::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by email. The caller passes the normalized address.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new account. A taken email surfaces as `Conflict`.
    pub async fn create(&self, model: account::ActiveModel) -> AppResult<account::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_error)
    }
}
