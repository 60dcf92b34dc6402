use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::nutrition::profile::PregnancyProfile;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub profile: Arc<PregnancyProfile>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        // SQLite can create a missing file but not a missing directory.
        if let Some(path) = config.database_url.strip_prefix("sqlite://") {
            if let Some(dir) = std::path::Path::new(path).parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir).context("create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .context("parse DATABASE_URL")?
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("connect to database")?;

        let profile = Arc::new(PregnancyProfile::new(&config.profile));

        Ok(Self {
            db,
            config,
            profile,
        })
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        let profile = Arc::new(PregnancyProfile::new(&config.profile));
        Self {
            db,
            config,
            profile,
        }
    }

    /// In-memory state for tests. SQLite keeps one database per connection
    /// when backed by memory, so the pool is capped at a single connection.
    pub async fn fake() -> Self {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("apply migrations");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            profile: crate::config::ProfileConfig {
                pregnancy_start_date: time::macros::date!(2025 - 12 - 02),
                due_date: time::macros::date!(2026 - 09 - 07),
            },
        });

        Self::from_parts(db, config)
    }
}
