//! Profile repository.

use std::sync::Arc;

use crate::db_error;
use crate::entities::{Profile, profile};
use aibuilders_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Func, LikeExpr},
};

/// Profile repository for database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by ID (the owning identity).
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find profiles by IDs. Missing IDs are simply absent from the result.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<profile::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Profile::find()
            .filter(profile::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by username, case-insensitively.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(profile::Column::UsernameLower.eq(username.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a username is held by any profile.
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    /// Create a new profile. A taken username surfaces as `Conflict`.
    pub async fn create(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_error)
    }

    /// Update a profile. A taken username surfaces as `Conflict`.
    pub async fn update(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model.update(self.db.as_ref()).await.map_err(db_error)
    }

    /// Search profiles whose username or display name contains `query`,
    /// ignoring case.
    ///
    /// `%` and `_` in the query match literally. Results are ordered by
    /// creation time, oldest first.
    pub async fn search(&self, query: &str, limit: u64) -> AppResult<Vec<profile::Model>> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

        let condition = Condition::any()
            .add(
                Expr::col(profile::Column::UsernameLower)
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            )
            .add(
                Expr::expr(Func::lower(Expr::col(profile::Column::DisplayName)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );

        Profile::find()
            .filter(condition)
            .order_by_asc(profile::Column::CreatedAt)
            .order_by_asc(profile::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_profile(id: &str, username: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            display_name: username.to_string(),
            bio: None,
            avatar_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ProfileRepository::new(db);
        let result = repo.find_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_username_exists() {
        let bob = create_test_profile("p1", "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob]])
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        assert!(repo.username_exists("BOB").await.unwrap());
        assert!(!repo.username_exists("carol").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_returns_rows() {
        let p1 = create_test_profile("p1", "rustacean");
        let p2 = create_test_profile("p2", "rusty");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.search("RUST", 20).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
