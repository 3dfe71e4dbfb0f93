//! Shared harness for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use aibuilders_common::{Config, IdGenerator};
use aibuilders_core::{CreateProfileInput, Services};
use aibuilders_db::{entities::account, repositories::AccountRepository, test_utils::TestDatabase};
use chrono::Utc;
use sea_orm::Set;

pub struct Harness {
    pub db: TestDatabase,
    pub services: Services,
    pub config: Config,
}

pub async fn harness() -> Harness {
    harness_with(Config::with_database_url("sqlite::memory:")).await
}

pub async fn harness_with(config: Config) -> Harness {
    let db = TestDatabase::in_memory().await.unwrap();
    let services = Services::new(db.shared(), &config).unwrap();
    Harness {
        db,
        services,
        config,
    }
}

impl Harness {
    /// Insert an account without going through password hashing.
    pub async fn seed_account(&self, email: &str) -> String {
        let id = IdGenerator::new().generate();
        AccountRepository::new(self.db.shared())
            .create(account::ActiveModel {
                id: Set(id.clone()),
                email: Set(email.to_string()),
                password_hash: Set("unused".to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await
            .unwrap();
        id
    }

    /// Insert an account with a profile and return its id.
    pub async fn seed_user(&self, username: &str) -> String {
        let id = self.seed_account(&format!("{username}@example.com")).await;
        self.services
            .profiles
            .create_profile(
                &id,
                CreateProfileInput {
                    username: username.to_string(),
                    display_name: username.to_string(),
                },
            )
            .await
            .unwrap();
        id
    }

    /// Publish a post and return its id.
    pub async fn seed_post(&self, author_id: &str, content: &str) -> String {
        self.services
            .posts
            .create_post(
                author_id,
                aibuilders_core::CreatePostInput {
                    content: content.to_string(),
                    image_url: None,
                },
            )
            .await
            .unwrap()
            .id
    }
}
