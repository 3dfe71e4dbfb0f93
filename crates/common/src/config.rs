//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity and session configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Feed composition configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Profile search configuration.
    #[serde(default)]
    pub search: SearchConfig,
    /// Image hosting configuration.
    #[serde(default)]
    pub media: MediaConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://...` in deployment, `sqlite::memory:` in tests).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Identity gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// How long a session token stays valid after sign-in.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

/// Feed composition configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedConfig {
    /// Whether the `Following` filter also shows the viewer's own posts.
    #[serde(default)]
    pub include_own_posts_in_following: bool,
}

/// Profile search configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Result count used when the caller does not ask for one.
    #[serde(default = "default_search_limit")]
    pub default_limit: u64,
    /// Upper bound on any requested result count.
    #[serde(default = "default_search_max_limit")]
    pub max_limit: u64,
}

/// Which image hosting backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    /// Files are written under `local_path` and served from `local_base_url`.
    #[default]
    Local,
    /// Files are posted to a Cloudinary-compatible upload endpoint.
    Cloudinary,
}

/// Image hosting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: MediaBackend,
    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Directory for the local backend.
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,
    /// Public URL prefix for the local backend.
    #[serde(default = "default_local_base_url")]
    pub local_base_url: String,
    /// Cloud name for the Cloudinary backend.
    #[serde(default)]
    pub cloudinary_cloud_name: Option<String>,
    /// Unsigned upload preset for the Cloudinary backend.
    #[serde(default = "default_upload_preset")]
    pub cloudinary_upload_preset: String,
    /// API base URL for the Cloudinary backend.
    #[serde(default = "default_cloudinary_api_base")]
    pub cloudinary_api_base: String,
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_session_ttl_hours() -> i64 {
    24 * 30
}

const fn default_search_limit() -> u64 {
    20
}

const fn default_search_max_limit() -> u64 {
    100
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_local_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_local_base_url() -> String {
    "/files".to_string()
}

fn default_upload_preset() -> String {
    "ml_default".to_string()
}

fn default_cloudinary_api_base() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            max_limit: default_search_max_limit(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            backend: MediaBackend::default(),
            max_upload_bytes: default_max_upload_bytes(),
            local_path: default_local_path(),
            local_base_url: default_local_base_url(),
            cloudinary_cloud_name: None,
            cloudinary_upload_preset: default_upload_preset(),
            cloudinary_api_base: default_cloudinary_api_base(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `AIBUILDERS_ENV`)
    /// 3. Environment variables with `AIBUILDERS__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("AIBUILDERS_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AIBUILDERS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("AIBUILDERS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Build a configuration that only names a database, leaving every other
    /// section at its defaults.
    #[must_use]
    pub fn with_database_url(url: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig {
                url: url.into(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
            },
            auth: AuthConfig::default(),
            feed: FeedConfig::default(),
            search: SearchConfig::default(),
            media: MediaConfig::default(),
        }
    }
}
