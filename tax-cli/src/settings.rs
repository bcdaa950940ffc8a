//! Optional TOML settings file.
//!
//! ```toml
//! assessment_year = "2026-27"
//! log_level = "debug"
//! log_file = "ctc-compare.log"
//! pf_policy = { mode = "fixed", value = 1800 }
//!
//! [database]
//! backend = "sqlite"
//! connection = "ctc-compare.db"
//! ```
//!
//! Every key is optional. Command-line flags win over the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{PfPolicy, within_limits};
use tax_core::builtin::DEFAULT_ASSESSMENT_YEAR;
use tax_core::db::DbConfig;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    pub backend: String,
    pub connection: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection: "ctc-compare.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub assessment_year: String,
    pub pf_policy: PfPolicy,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            assessment_year: DEFAULT_ASSESSMENT_YEAR.to_string(),
            pf_policy: PfPolicy::default(),
            log_level: None,
            log_file: None,
        }
    }
}

/// Values given on the command line. `None` leaves the setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub backend: Option<String>,
    pub connection: Option<String>,
    pub assessment_year: Option<String>,
    pub pf_percent: Option<Decimal>,
    pub pf_fixed: Option<Decimal>,
    pub log_level: Option<String>,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text).context("invalid settings")?;
        ensure!(
            within_limits(Decimal::ZERO, &settings.pf_policy),
            "pf_policy value {} is out of range",
            settings.pf_policy.value()
        );
        Ok(settings)
    }

    /// Reads `path`, or returns the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read settings file '{}'", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in '{}'", path.display()))
    }

    pub fn apply(
        mut self,
        overrides: Overrides,
    ) -> Self {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(connection) = overrides.connection {
            self.database.connection = connection;
        }
        if let Some(year) = overrides.assessment_year {
            self.assessment_year = year;
        }
        if let Some(percent) = overrides.pf_percent {
            self.pf_policy = PfPolicy::Percentage(percent);
        }
        if let Some(fixed) = overrides.pf_fixed {
            self.pf_policy = PfPolicy::Fixed(fixed);
        }
        if overrides.log_level.is_some() {
            self.log_level = overrides.log_level;
        }
        self
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.database.backend.clone(),
            connection_string: self.database.connection.clone(),
        }
    }
}
