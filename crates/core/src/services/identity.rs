//! Identity gateway.
//!
//! The rest of the core only needs "who is acting". [`IdentityGateway`] is the
//! seam to whatever issues identities; [`DbIdentityGateway`] keeps accounts
//! and sessions in the same database as everything else.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use aibuilders_common::{AppError, AppResult, IdGenerator};
use aibuilders_db::{
    entities::{account, session},
    repositories::{AccountRepository, SessionRepository},
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// A signed-in session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
    pub expires_at: DateTimeWithTimeZone,
}

/// Issues and resolves identities.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Register a new identity.
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity>;

    /// Open a session. Wrong credentials are `Unauthorized`.
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;

    /// Close a session. Unknown tokens are ignored.
    async fn sign_out(&self, token: &str) -> AppResult<()>;

    /// Resolve a session token to its identity, if the session is live.
    async fn current_identity(&self, token: &str) -> AppResult<Option<Identity>>;
}

/// Identity gateway backed by the `account` and `session` tables.
#[derive(Clone)]
pub struct DbIdentityGateway {
    account_repo: AccountRepository,
    session_repo: SessionRepository,
    session_ttl: Duration,
    id_gen: IdGenerator,
}

impl DbIdentityGateway {
    /// Create a new gateway whose sessions live for `session_ttl_hours`.
    ///
    /// A TTL too large to represent is a configuration error.
    pub fn new(
        account_repo: AccountRepository,
        session_repo: SessionRepository,
        session_ttl_hours: i64,
    ) -> AppResult<Self> {
        let session_ttl = Duration::try_hours(session_ttl_hours.max(1)).ok_or_else(|| {
            AppError::Config(format!(
                "auth.session_ttl_hours is out of range: {session_ttl_hours}"
            ))
        })?;

        Ok(Self {
            account_repo,
            session_repo,
            session_ttl,
            id_gen: IdGenerator::new(),
        })
    }

    /// Remove expired sessions. Returns how many were removed.
    pub async fn purge_expired_sessions(&self) -> AppResult<u64> {
        let removed = self.session_repo.delete_expired().await?;
        tracing::debug!(removed, "Purged expired sessions");
        Ok(removed)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityGateway for DbIdentityGateway {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity> {
        let email = normalize_email(email);

        if self.account_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let model = account::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(email),
            password_hash: Set(hash_password(password)?),
            created_at: Set(Utc::now().into()),
        };

        let account = self.account_repo.create(model).await?;
        tracing::info!(account_id = %account.id, "Identity registered");

        Ok(Identity {
            id: account.id,
            email: account.email,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let account = self
            .account_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &account.password_hash)? {
            tracing::debug!(account_id = %account.id, "Rejected sign-in");
            return Err(AppError::Unauthorized);
        }

        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.session_ttl).ok_or_else(|| {
            AppError::Config("auth.session_ttl_hours overflows the session expiry".to_string())
        })?;
        let model = session::ActiveModel {
            token: Set(self.id_gen.generate_session_token()),
            account_id: Set(account.id.clone()),
            created_at: Set(now.into()),
            expires_at: Set(expires_at.into()),
        };
        let session = self.session_repo.create(model).await?;
        tracing::info!(account_id = %account.id, "Session opened");

        Ok(Session {
            token: session.token,
            identity: Identity {
                id: account.id,
                email: account.email,
            },
            expires_at: session.expires_at,
        })
    }

    async fn sign_out(&self, token: &str) -> AppResult<()> {
        if self.session_repo.delete_by_token(token).await? {
            tracing::info!("Session closed");
        }
        Ok(())
    }

    async fn current_identity(&self, token: &str) -> AppResult<Option<Identity>> {
        let Some(session) = self.session_repo.find_active(token).await? else {
            return Ok(None);
        };

        let account = self.account_repo.find_by_id(&session.account_id).await?;
        Ok(account.map(|a| Identity {
            id: a.id,
            email: a.email,
        }))
    }
}

/// Hash a password.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
