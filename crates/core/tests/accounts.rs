//! Sign-up and sessions against a migrated database.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use aibuilders_common::{AppError, AppResult, Config};
use aibuilders_core::{
    DbIdentityGateway, Identity, IdentityGateway, LocalImageHost, Services, Session, SignUpInput,
};
use aibuilders_db::{
    entities::{account, profile, session},
    repositories::{AccountRepository, ProfileRepository, SessionRepository},
    test_utils::TestDatabase,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{DatabaseConnection, Set};

fn sign_up(email: &str, username: &str) -> SignUpInput {
    SignUpInput {
        email: email.to_string(),
        password: "correct horse".to_string(),
        username: username.to_string(),
    }
}

#[tokio::test]
async fn sign_up_creates_identity_and_profile() {
    let h = common::harness().await;

    let registration = h
        .services
        .accounts
        .sign_up(sign_up("Ada@Example.com", "Ada"))
        .await
        .unwrap();

    assert_eq!(registration.identity.email, "ada@example.com");
    assert_eq!(registration.profile.id, registration.identity.id);
    assert_eq!(registration.profile.username, "ada");
    assert_eq!(registration.profile.display_name, "Ada");
}

#[tokio::test]
async fn sign_up_rejects_taken_username_and_email() {
    let h = common::harness().await;
    h.services
        .accounts
        .sign_up(sign_up("ada@example.com", "ada"))
        .await
        .unwrap();

    assert!(matches!(
        h.services
            .accounts
            .sign_up(sign_up("other@example.com", "ADA"))
            .await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        h.services
            .accounts
            .sign_up(sign_up("ADA@example.com", "someone_else"))
            .await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn sign_in_and_out() {
    let h = common::harness().await;
    let registration = h
        .services
        .accounts
        .sign_up(sign_up("ada@example.com", "ada"))
        .await
        .unwrap();

    assert!(matches!(
        h.services
            .accounts
            .sign_in("ada@example.com", "wrong horse")
            .await,
        Err(AppError::Unauthorized)
    ));

    let session = h
        .services
        .accounts
        .sign_in(" ADA@example.com ", "correct horse")
        .await
        .unwrap();
    let identity = h
        .services
        .accounts
        .require_identity(&session.token)
        .await
        .unwrap();
    assert_eq!(identity.id, registration.identity.id);

    h.services.accounts.sign_out(&session.token).await.unwrap();

    assert!(
        h.services
            .accounts
            .current_identity(&session.token)
            .await
            .unwrap()
            .is_none()
    );
    assert!(matches!(
        h.services.accounts.require_identity(&session.token).await,
        Err(AppError::Unauthorized)
    ));
}

/// Gateway that lets another account claim the username while the identity
/// is being created.
struct RacingGateway {
    db: Arc<DatabaseConnection>,
    identity_id: String,
    rival_id: String,
    contested_username: String,
}

impl RacingGateway {
    async fn insert_account(&self, id: &str, email: &str) -> AppResult<()> {
        AccountRepository::new(Arc::clone(&self.db))
            .create(account::ActiveModel {
                id: Set(id.to_string()),
                email: Set(email.to_string()),
                password_hash: Set("unused".to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityGateway for RacingGateway {
    async fn sign_up(&self, email: &str, _password: &str) -> AppResult<Identity> {
        self.insert_account(&self.rival_id, "rival@example.com").await?;
        ProfileRepository::new(Arc::clone(&self.db))
            .create(profile::ActiveModel {
                id: Set(self.rival_id.clone()),
                username: Set(self.contested_username.clone()),
                username_lower: Set(self.contested_username.clone()),
                display_name: Set("Rival".to_string()),
                bio: Set(None),
                avatar_url: Set(None),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            })
            .await?;

        self.insert_account(&self.identity_id, email).await?;
        Ok(Identity {
            id: self.identity_id.clone(),
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> AppResult<Session> {
        Err(AppError::Unauthorized)
    }

    async fn sign_out(&self, _token: &str) -> AppResult<()> {
        Ok(())
    }

    async fn current_identity(&self, _token: &str) -> AppResult<Option<Identity>> {
        Ok(None)
    }
}

#[tokio::test]
async fn username_claimed_during_sign_up_leaves_identity_without_profile() {
    let db = TestDatabase::in_memory().await.unwrap();
    let config = Config::with_database_url("sqlite::memory:");
    let gateway = Arc::new(RacingGateway {
        db: db.shared(),
        identity_id: "01j00000000000000000000ada".to_string(),
        rival_id: "01j0000000000000000000rival".to_string(),
        contested_username: "ada".to_string(),
    });
    let services = Services::with_collaborators(
        db.shared(),
        &config,
        gateway,
        Arc::new(LocalImageHost::new(
            std::env::temp_dir(),
            "/files".to_string(),
        )),
    );

    let result = services
        .accounts
        .sign_up(sign_up("ada@example.com", "Ada"))
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(
        AccountRepository::new(db.shared())
            .find_by_id("01j00000000000000000000ada")
            .await
            .unwrap()
            .is_some()
    );
    assert!(matches!(
        services.profiles.get_profile("01j00000000000000000000ada").await,
        Err(AppError::UserNotFound(_))
    ));
    let holder = services.profiles.get_profile_by_username("ada").await.unwrap();
    assert_eq!(holder.id, "01j0000000000000000000rival");
}

#[tokio::test]
async fn expired_sessions_resolve_to_nobody_and_are_purged() {
    let h = common::harness().await;
    let registration = h
        .services
        .accounts
        .sign_up(sign_up("ada@example.com", "ada"))
        .await
        .unwrap();

    let sessions = SessionRepository::new(h.db.shared());
    let expired_at = Utc::now() - Duration::hours(1);
    sessions
        .create(session::ActiveModel {
            token: Set("expired-token".to_string()),
            account_id: Set(registration.identity.id.clone()),
            created_at: Set((expired_at - Duration::hours(24)).into()),
            expires_at: Set(expired_at.into()),
        })
        .await
        .unwrap();

    assert!(
        h.services
            .accounts
            .current_identity("expired-token")
            .await
            .unwrap()
            .is_none()
    );
    assert!(matches!(
        h.services.accounts.require_identity("expired-token").await,
        Err(AppError::Unauthorized)
    ));

    let live = h
        .services
        .accounts
        .sign_in("ada@example.com", "correct horse")
        .await
        .unwrap();

    let gateway = DbIdentityGateway::new(
        AccountRepository::new(h.db.shared()),
        sessions.clone(),
        h.config.auth.session_ttl_hours,
    )
    .unwrap();
    assert_eq!(gateway.purge_expired_sessions().await.unwrap(), 1);

    assert!(sessions.find_by_token("expired-token").await.unwrap().is_none());
    let identity = h
        .services
        .accounts
        .require_identity(&live.token)
        .await
        .unwrap();
    assert_eq!(identity.id, registration.identity.id);
}
