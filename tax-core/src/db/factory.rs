use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{Repository, RepositoryError};

/// Which backend to open and how to reach it.
///
/// | backend  | connection_string                         |
/// |----------|-------------------------------------------|
/// | `sqlite` | `ctc.db`, `sqlite:ctc.db`, `:memory:`     |
/// | `memory` | ignored                                   |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Name of a registered [`RepositoryFactory`].
    pub backend: String,
    /// Handed to the factory as-is.
    pub connection_string: String,
}

impl DbConfig {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: path.into(),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: String::new(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::sqlite(":memory:")
    }
}

/// Opens repositories for one backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Connects and prepares the store (migrations, seeds) before returning.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn Repository>, RepositoryError>;
}

/// Backend factories keyed by name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`, replacing any factory registered under the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Sorted backend names.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn is_registered(
        &self,
        backend: &str,
    ) -> bool {
        self.factories.contains_key(backend)
    }

    /// Opens a repository with the factory named by `config.backend`.
    ///
    /// An unregistered backend is a [`RepositoryError::Configuration`];
    /// factory failures pass through unchanged.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn Repository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            )));
        };

        debug!(backend = %config.backend, "opening repository");
        factory.create(config).await
    }
}
