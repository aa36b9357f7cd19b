//! # roombus-db
//!
//! Database layer for the room bus core.
//!
//! Backend is selected automatically from `DATABASE_URL`: `postgres://…` for
//! production deployments, `sqlite://…` for single-node/dev use. Both run
//! through `sqlx::AnyPool` so the repository layer is backend-agnostic.

pub mod repository;

use anyhow::Result;

/// Which backing store is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Postgres,
    Sqlite,
}

impl DbBackend {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            DbBackend::Sqlite
        } else {
            DbBackend::Postgres
        }
    }
}

/// Shared database handle threaded through every component.
#[derive(Clone)]
pub struct Database {
    /// SQL pool — works with both Postgres and SQLite.
    pub pool: sqlx::AnyPool,
    pub backend: DbBackend,
}

impl Database {
    /// Connect using the URL in `config.database.url`.
    pub async fn connect(config: &roombus_common::config::AppConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let backend = DbBackend::from_url(&config.database.url);

        let pool = match backend {
            DbBackend::Postgres => {
                tracing::info!("connecting to PostgreSQL");
                sqlx::any::AnyPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .connect(&config.database.url)
                    .await?
            }
            DbBackend::Sqlite => {
                tracing::info!(url = %config.database.url, "connecting to SQLite");
                sqlx::any::AnyPoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .connect(&config.database.url)
                    .await?
            }
        };

        Ok(Self { pool, backend })
    }

    /// Run migrations appropriate for the active backend.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("running database migrations");
        match self.backend {
            DbBackend::Postgres => {
                sqlx::migrate!("./migrations").run(&self.pool).await?;
            }
            DbBackend::Sqlite => {
                sqlx::migrate!("./migrations-lite").run(&self.pool).await?;
            }
        }
        tracing::info!("migrations complete");
        Ok(())
    }

    /// Run a group of operations inside a single transaction, committing only
    /// if every step succeeds (§5 "Shared-resource policy" — rundown
    /// current-item switch, participant admit transitions).
    pub async fn transaction<F, T>(&self, f: F) -> Result<T, sqlx::Error>
    where
        for<'c> F: FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Any>,
        ) -> futures_util::future::BoxFuture<'c, Result<T, sqlx::Error>>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}
