//! Account flow: sign-up, sign-in and session resolution.

use std::sync::Arc;

use aibuilders_common::{AppError, AppResult};
use aibuilders_db::entities::profile;
use serde::Deserialize;
use validator::Validate;

use crate::services::identity::{Identity, IdentityGateway, Session};
use crate::services::profile::{CreateProfileInput, ProfileService};

/// Input for signing up.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 64))]
    pub username: String,
}

/// A freshly registered identity with its profile.
#[derive(Debug, Clone)]
pub struct Registration {
    pub identity: Identity,
    pub profile: profile::Model,
}

/// Account service.
#[derive(Clone)]
pub struct AccountService {
    gateway: Arc<dyn IdentityGateway>,
    profiles: ProfileService,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(gateway: Arc<dyn IdentityGateway>, profiles: ProfileService) -> Self {
        Self { gateway, profiles }
    }

    /// Register an identity and create its profile.
    ///
    /// The display name starts out as the username as typed. If the profile
    /// cannot be created once the identity exists, the identity is left
    /// without a profile and the error is returned.
    pub async fn sign_up(&self, input: SignUpInput) -> AppResult<Registration> {
        let input = SignUpInput {
            email: input.email.trim().to_string(),
            username: input.username.trim().to_string(),
            password: input.password,
        };
        input.validate()?;

        self.profiles.ensure_username_available(&input.username).await?;

        let identity = self.gateway.sign_up(&input.email, &input.password).await?;

        let profile = match self
            .profiles
            .create_profile(
                &identity.id,
                CreateProfileInput {
                    username: input.username.clone(),
                    display_name: input.username,
                },
            )
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(
                    identity_id = %identity.id,
                    error = %e,
                    "Profile creation failed after sign-up; identity has no profile"
                );
                return Err(e);
            }
        };

        Ok(Registration { identity, profile })
    }

    /// Open a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        self.gateway.sign_in(email, password).await
    }

    /// Close a session.
    pub async fn sign_out(&self, token: &str) -> AppResult<()> {
        self.gateway.sign_out(token).await
    }

    /// The identity behind a session token, if any.
    pub async fn current_identity(&self, token: &str) -> AppResult<Option<Identity>> {
        self.gateway.current_identity(token).await
    }

    /// The identity behind a session token; `Unauthorized` when there is none.
    pub async fn require_identity(&self, token: &str) -> AppResult<Identity> {
        self.current_identity(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aibuilders_common::config::SearchConfig;
    use aibuilders_db::repositories::ProfileRepository;
    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gateway that hands out one fixed identity and never opens sessions.
    #[derive(Default)]
    struct StubGateway {
        sign_ups: AtomicUsize,
    }

    #[async_trait]
    impl IdentityGateway for StubGateway {
        async fn sign_up(&self, email: &str, _password: &str) -> AppResult<Identity> {
            self.sign_ups.fetch_add(1, Ordering::SeqCst);
            Ok(Identity {
                id: "id1".to_string(),
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

    fn service(db: sea_orm::DatabaseConnection, gateway: Arc<StubGateway>) -> AccountService {
        AccountService::new(
            gateway,
            ProfileService::new(
                ProfileRepository::new(Arc::new(db)),
                SearchConfig::default(),
            ),
        )
    }

    fn input(email: &str, password: &str, username: &str) -> SignUpInput {
        SignUpInput {
            email: email.to_string(),
            password: password.to_string(),
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn test_short_password_is_rejected() {
        let gateway = Arc::new(StubGateway::default());
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            gateway.clone(),
        );

        let result = svc.sign_up(input("ada@example.com", "short", "ada")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(gateway.sign_ups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_email_is_rejected() {
        let gateway = Arc::new(StubGateway::default());
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            gateway.clone(),
        );

        let result = svc.sign_up(input("not-an-email", "password1", "ada")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_taken_username_stops_before_identity() {
        let taken = profile::Model {
            id: "other".to_string(),
            username: "ada".to_string(),
            username_lower: "ada".to_string(),
            display_name: "Ada".to_string(),
            bio: None,
            avatar_url: None,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[taken]])
            .into_connection();
        let gateway = Arc::new(StubGateway::default());

        let result = service(db, gateway.clone())
            .sign_up(input("ada@example.com", "password1", "ADA"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(gateway.sign_ups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_require_identity_without_session() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            Arc::new(StubGateway::default()),
        );

        let result = svc.require_identity("nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
