//! Process-local repository backend.
//!
//! Nothing survives the process. Useful for tests and for running the
//! consumer without a database file.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{Repository, RepositoryError, ScenarioStore, TaxRepository};
use crate::builtin;
use crate::models::{
    AssessmentYear, CtcConfiguration, NewCtcConfiguration, Regime, ScenarioVersion,
    TaxSlabConfiguration,
};

type ConfigKey = (String, Regime);

#[derive(Debug, Default)]
pub struct MemoryRepository {
    configurations: Mutex<BTreeMap<ConfigKey, TaxSlabConfiguration>>,
    scenarios: Mutex<BTreeMap<i64, CtcConfiguration>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository holding the built-in configurations.
    pub fn seeded() -> Self {
        let configurations = builtin::configurations()
            .into_iter()
            .map(|c| ((c.assessment_year.clone(), c.regime), c))
            .collect();
        Self {
            configurations: Mutex::new(configurations),
            scenarios: Mutex::default(),
        }
    }

    fn configurations(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<ConfigKey, TaxSlabConfiguration>>, RepositoryError> {
        self.configurations
            .lock()
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }

    fn scenarios(&self) -> Result<MutexGuard<'_, BTreeMap<i64, CtcConfiguration>>, RepositoryError> {
        self.scenarios
            .lock()
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }
}

#[async_trait]
impl TaxRepository for MemoryRepository {
    async fn get_configuration(
        &self,
        assessment_year: &str,
        regime: Regime,
    ) -> Result<TaxSlabConfiguration, RepositoryError> {
        debug!(assessment_year, %regime, "looking up slab configuration");
        self.configurations()?
            .get(&(assessment_year.to_string(), regime))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_assessment_years(
        &self,
        regime: Regime,
    ) -> Result<Vec<AssessmentYear>, RepositoryError> {
        let mut years: Vec<_> = self
            .configurations()?
            .keys()
            .filter(|(_, r)| *r == regime)
            .map(|(year, _)| AssessmentYear::new(year))
            .collect();
        AssessmentYear::sort_newest_first(&mut years);
        Ok(years)
    }

    async fn replace_configuration(
        &self,
        config: &TaxSlabConfiguration,
    ) -> Result<(), RepositoryError> {
        config.validate()?;
        self.configurations()?.insert(
            (config.assessment_year.clone(), config.regime),
            config.clone(),
        );
        Ok(())
    }

    async fn delete_configuration(
        &self,
        assessment_year: &str,
        regime: Regime,
    ) -> Result<(), RepositoryError> {
        self.configurations()?
            .remove(&(assessment_year.to_string(), regime))
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl ScenarioStore for MemoryRepository {
    async fn save(
        &self,
        scenario: NewCtcConfiguration,
    ) -> Result<CtcConfiguration, RepositoryError> {
        let mut scenarios = self.scenarios()?;
        let version = scenarios.keys().next_back().map_or(1, |v| v + 1);
        let saved = scenario.into_saved(version, Utc::now());
        scenarios.insert(version, saved.clone());
        debug!(version, "saved scenario");
        Ok(saved)
    }

    async fn get(
        &self,
        version: i64,
    ) -> Result<CtcConfiguration, RepositoryError> {
        self.scenarios()?
            .get(&version)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_latest(&self) -> Result<Option<CtcConfiguration>, RepositoryError> {
        Ok(self.scenarios()?.values().next_back().cloned())
    }

    async fn delete(
        &self,
        version: i64,
    ) -> Result<(), RepositoryError> {
        self.scenarios()?
            .remove(&version)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_versions(&self) -> Result<Vec<ScenarioVersion>, RepositoryError> {
        Ok(self
            .scenarios()?
            .values()
            .rev()
            .map(|s| ScenarioVersion {
                version: s.version,
                saved_at: s.saved_at,
            })
            .collect())
    }

    async fn clear_all(&self) -> Result<(), RepositoryError> {
        self.scenarios()?.clear();
        Ok(())
    }
}

/// Registers as `memory`. The connection string is ignored; every
/// repository starts with the built-in configurations.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn Repository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::seeded()))
    }
}
