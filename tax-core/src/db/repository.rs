use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AssessmentYear, ConfigurationError, CtcConfiguration, NewCtcConfiguration, Regime,
    ScenarioVersion, TaxSlabConfiguration,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid tax slab configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
}

/// Resolves tax slab configurations by assessment year and regime.
#[async_trait]
pub trait TaxRepository: Send + Sync {
    /// Slabs come back in ascending order of ceiling.
    async fn get_configuration(
        &self,
        assessment_year: &str,
        regime: Regime,
    ) -> Result<TaxSlabConfiguration, RepositoryError>;

    /// Distinct years for `regime`, newest first.
    async fn list_assessment_years(
        &self,
        regime: Regime,
    ) -> Result<Vec<AssessmentYear>, RepositoryError>;

    /// Validates `config`, then replaces any configuration stored under the
    /// same year and regime.
    async fn replace_configuration(
        &self,
        config: &TaxSlabConfiguration,
    ) -> Result<(), RepositoryError>;

    async fn delete_configuration(
        &self,
        assessment_year: &str,
        regime: Regime,
    ) -> Result<(), RepositoryError>;
}

/// Versioned store of saved salary-comparison scenarios.
///
/// Versions start at 1 and each save takes the highest existing version
/// plus one. Concurrent writers are last-write-wins.
#[async_trait]
pub trait ScenarioStore: Send + Sync {
    async fn save(
        &self,
        scenario: NewCtcConfiguration,
    ) -> Result<CtcConfiguration, RepositoryError>;

    async fn get(
        &self,
        version: i64,
    ) -> Result<CtcConfiguration, RepositoryError>;

    async fn get_latest(&self) -> Result<Option<CtcConfiguration>, RepositoryError>;

    async fn delete(
        &self,
        version: i64,
    ) -> Result<(), RepositoryError>;

    /// Highest version first.
    async fn list_versions(&self) -> Result<Vec<ScenarioVersion>, RepositoryError>;

    async fn clear_all(&self) -> Result<(), RepositoryError>;
}

/// A backend that serves both configurations and saved scenarios.
pub trait Repository: TaxRepository + ScenarioStore {}

impl<T: TaxRepository + ScenarioStore> Repository for T {}
