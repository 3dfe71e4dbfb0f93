//! Post like repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db_error;
use crate::entities::{PostLike, post_like};
use aibuilders_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, sea_query::Expr,
};

/// Post like repository for database operations.
#[derive(Clone)]
pub struct PostLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLikeRepository {
    /// Create a new post like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the like a user left on a post.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<post_like::Model>> {
        PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a like. A duplicate `(post_id, user_id)` surfaces as `Conflict`.
    pub async fn create(&self, model: post_like::ActiveModel) -> AppResult<post_like::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_error)
    }

    /// Remove a user's like from a post. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let result = PostLike::delete_many()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes for each of `post_ids` in one query.
    ///
    /// Posts without likes are absent from the map.
    pub async fn count_by_posts(&self, post_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = PostLike::find()
            .select_only()
            .column(post_like::Column::PostId)
            .column_as(Expr::col(post_like::Column::Id).count(), "like_count")
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .group_by(post_like::Column::PostId)
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(post_id, count)| (post_id, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    /// Which of `post_ids` the user has liked, in one query.
    pub async fn liked_post_ids(
        &self,
        user_id: &str,
        post_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = PostLike::find()
            .select_only()
            .column(post_like::Column::PostId)
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ids.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_like(id: &str, post_id: &str, user_id: &str) -> post_like::Model {
        post_like::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let like = create_test_like("l1", "post1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like]])
                .into_connection(),
        );

        let repo = PostLikeRepository::new(db);
        let found = repo.find_by_pair("user1", "post1").await.unwrap();

        assert_eq!(found.unwrap().id, "l1");
    }

    #[tokio::test]
    async fn test_delete_by_pair_missing_is_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PostLikeRepository::new(db);
        assert!(!repo.delete_by_pair("user1", "post1").await.unwrap());
    }

    #[tokio::test]
    async fn test_batched_lookups_skip_empty_input() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostLikeRepository::new(db);
        assert!(repo.count_by_posts(&[]).await.unwrap().is_empty());
        assert!(repo.liked_post_ids("user1", &[]).await.unwrap().is_empty());
    }
}
