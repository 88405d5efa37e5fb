use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use taxlator_core::db::{DbConfig, HistoryRepository, RepositoryError, RepositoryFactory};
use tracing::info;

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`taxlator_core::db::RepositoryRegistry`] to make
/// the `"sqlite"` backend available:
///
/// ```rust,no_run
/// use taxlator_core::db::RepositoryRegistry;
/// use taxlator_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

/// Maps a bare connection string onto a sqlx URL.
fn database_url(connection_string: &str) -> String {
    match connection_string {
        ":memory:" => "sqlite::memory:".to_string(),
        s if s.starts_with("sqlite:") => s.to_string(),
        path => format!("sqlite:{path}?mode=rwc"),
    }
}

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Accepts a bare file path (created if missing), `:memory:`, or a full
    /// `sqlite:` URL. Migrations run before the repository is returned.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError> {
        let url = database_url(&config.connection_string);

        let repo = if url == "sqlite::memory:" {
            // Every pooled connection would otherwise get its own empty database.
            let options: SqliteConnectOptions = url
                .parse()
                .map_err(|e: sqlx::Error| RepositoryError::Connection(e.to_string()))?;
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
                .map_err(|e| RepositoryError::Connection(e.to_string()))?;
            SqliteRepository::new_with_pool(pool)
        } else {
            SqliteRepository::new(&url)
                .await
                .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?
        };

        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        info!(url = %url, "opened SQLite history store");
        Ok(Box::new(repo))
    }
}
