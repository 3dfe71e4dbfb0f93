//! Operations binary: applies schema migrations and housekeeping.
//!
//! The social core has no network surface of its own; deployments run this
//! once per release before starting whatever embeds `aibuilders-core`.

use std::sync::Arc;

use aibuilders_common::{AppError, Config};
use aibuilders_core::{DbIdentityGateway, image_host_from_config};
use aibuilders_db::repositories::{AccountRepository, SessionRepository};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aibuilders=debug,sea_orm=info".into()),
        )
        .init();

    info!("Starting aibuilders-migrate");

    let config = Config::load()?;

    let db = Arc::new(
        aibuilders_db::init(&config)
            .await
            .inspect_err(AppError::log)?,
    );
    info!("Connected to database");

    aibuilders_db::migrate(&db).await.inspect_err(AppError::log)?;
    info!("Migrations completed");

    // Fails early on a broken media section
    image_host_from_config(&config.media).inspect_err(AppError::log)?;

    let gateway = DbIdentityGateway::new(
        AccountRepository::new(Arc::clone(&db)),
        SessionRepository::new(db),
        config.auth.session_ttl_hours,
    )
    .inspect_err(AppError::log)?;
    let purged = gateway
        .purge_expired_sessions()
        .await
        .inspect_err(AppError::log)?;
    info!(purged, "Expired sessions purged");

    Ok(())
}
