use std::path::PathBuf;

use async_trait::async_trait;
use tax_core::db::{DbConfig, Repository, RepositoryError, RepositoryFactory};
use tracing::info;

use crate::repository::SqliteRepository;

/// Directory holding the seed SQL files.
///
/// 1. `TAX_DB_SQLITE_SEEDS_DIR`, when set.
/// 2. `./seeds`, when it exists.
/// 3. The crate's own `seeds` directory.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TAX_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// Turns a connection string into a sqlx URL.
///
/// Bare paths open read-write and are created when missing; `sqlite:` URLs
/// pass through untouched.
pub fn connection_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else if trimmed == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{trimmed}?mode=rwc")
    }
}

/// Registers as `sqlite`.
///
/// ```rust,no_run
/// use tax_core::db::RepositoryRegistry;
/// use tax_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Connects, migrates, then applies the seed files from [`seeds_dir`].
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn Repository>, RepositoryError> {
        let url = connection_url(&config.connection_string);
        let repo = SqliteRepository::new(&url)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        repo.run_seeds(&seeds)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        info!(url = %url, seeds = %seeds.display(), "opened sqlite repository");
        Ok(Box::new(repo))
    }
}
