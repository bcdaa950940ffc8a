use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use tax_core::calculations::{ComparisonResult, compare, summarize};
use tax_core::db::{MemoryRepositoryFactory, RepositoryRegistry};
use tax_core::{
    ConfigurationError, CtcConfiguration, IncomeBreakdown, MAX_EXPECTED_SALARIES,
    NewCtcConfiguration, PfPolicy, Regime, Repository, RepositoryError, TaxEngine,
    TaxSlabConfiguration,
};
use tax_db_sqlite::SqliteRepositoryFactory;

/// Registry with every backend this binary can open.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// Resolves the new-regime slabs for `assessment_year`.
pub async fn load_configuration(
    repo: &dyn Repository,
    assessment_year: &str,
) -> Result<TaxSlabConfiguration> {
    debug!(assessment_year, "loading slab configuration");
    match repo.get_configuration(assessment_year, Regime::New).await {
        Ok(config) => Ok(config),
        Err(RepositoryError::NotFound) => {
            let known: Vec<String> = repo
                .list_assessment_years(Regime::New)
                .await
                .context("failed to list assessment years")?
                .into_iter()
                .map(|y| y.year)
                .collect();
            anyhow::bail!(
                "no slab configuration for AY {assessment_year} (available: {})",
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            )
        }
        Err(e) => Err(e).with_context(|| format!("failed to load AY {assessment_year}")),
    }
}

/// Expected salaries measured against the current CTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    pub assessment_year: String,
    pub pf_policy: PfPolicy,
    pub baseline: IncomeBreakdown,
    pub options: Vec<IncomeBreakdown>,
    pub results: Vec<ComparisonResult>,
    pub summary: String,
    /// Salaries past [`MAX_EXPECTED_SALARIES`] that were left out.
    pub dropped: usize,
}

pub fn compare_salaries(
    config: &TaxSlabConfiguration,
    previous_salary: Decimal,
    expected_salaries: &[Decimal],
    pf_policy: &PfPolicy,
) -> Result<ComparisonReport, ConfigurationError> {
    let engine = TaxEngine::new(config)?;

    let kept = expected_salaries.len().min(MAX_EXPECTED_SALARIES);
    let dropped = expected_salaries.len() - kept;
    if dropped > 0 {
        warn!(
            dropped,
            max = MAX_EXPECTED_SALARIES,
            "too many expected salaries, comparing the first {MAX_EXPECTED_SALARIES}"
        );
    }

    let baseline = engine.compute_breakdown(previous_salary, pf_policy);
    let options: Vec<IncomeBreakdown> = expected_salaries[..kept]
        .iter()
        .map(|&ctc| engine.compute_breakdown(ctc, pf_policy))
        .collect();
    let results = compare(&options, &baseline);
    let summary = summarize(&options, &config.assessment_year);

    Ok(ComparisonReport {
        assessment_year: config.assessment_year.clone(),
        pf_policy: *pf_policy,
        baseline,
        options,
        results,
        summary,
        dropped,
    })
}

pub async fn save_scenario(
    repo: &dyn Repository,
    scenario: NewCtcConfiguration,
) -> Result<CtcConfiguration> {
    let saved = repo.save(scenario).await.context("failed to save scenario")?;
    info!(version = saved.version, "saved scenario");
    Ok(saved)
}

/// Replays a saved scenario against its own assessment year.
pub async fn run_scenario(
    repo: &dyn Repository,
    version: i64,
) -> Result<(CtcConfiguration, ComparisonReport)> {
    let scenario = repo
        .get(version)
        .await
        .with_context(|| format!("failed to load scenario v{version}"))?;
    let config = load_configuration(repo, &scenario.assessment_year).await?;
    let report = compare_salaries(
        &config,
        scenario.previous_salary,
        &scenario.expected_salaries,
        &scenario.pf_policy,
    )
    .with_context(|| format!("AY {} cannot be used", scenario.assessment_year))?;
    Ok((scenario, report))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::builtin;
    use tax_core::db::{DbConfig, MemoryRepository};

    use super::*;

    fn config() -> TaxSlabConfiguration {
        builtin::configuration("2026-27").unwrap()
    }

    #[test]
    fn registry_knows_both_backends() {
        let registry = build_registry();

        assert!(registry.is_registered("sqlite"));
        assert!(registry.is_registered("memory"));
    }

    #[tokio::test]
    async fn load_configuration_from_memory_backend() {
        let repo = build_registry().create(&DbConfig::memory()).await.unwrap();

        let loaded = load_configuration(&*repo, "2026-27").await.unwrap();

        assert_eq!(loaded, config());
    }

    #[tokio::test]
    async fn unknown_year_lists_available_years() {
        let repo = MemoryRepository::seeded();

        let err = load_configuration(&repo, "2030-31").await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "no slab configuration for AY 2030-31 (available: 2026-27, 2025-26, 2024-25, 2023-24)"
        );
    }

    #[tokio::test]
    async fn unknown_year_on_empty_store() {
        let repo = MemoryRepository::new();

        let err = load_configuration(&repo, "2026-27").await.unwrap_err();

        assert!(err.to_string().ends_with("(available: none)"));
    }

    #[test]
    fn compares_against_previous_salary() {
        let pf = PfPolicy::Percentage(dec!(12));

        let report =
            compare_salaries(&config(), dec!(1500000), &[dec!(1700000), dec!(1500000)], &pf)
                .unwrap();

        assert_eq!(report.options.len(), 2);
        assert_eq!(report.dropped, 0);
        assert_eq!(report.options[0].total_tax_annual, dec!(96876));
        assert_eq!(report.results[1].hike_percent, Decimal::ZERO);
        assert_eq!(report.results[1].extra_monthly_cash, Decimal::ZERO);
        assert!(report.results[0].extra_monthly_cash > Decimal::ZERO);
        assert!(report.summary.starts_with("India Income Tax Calculator for AY 2026-27"));
    }

    #[test]
    fn caps_expected_salaries() {
        let salaries = vec![dec!(1000000); MAX_EXPECTED_SALARIES + 2];

        let report =
            compare_salaries(&config(), dec!(900000), &salaries, &PfPolicy::default()).unwrap();

        assert_eq!(report.options.len(), MAX_EXPECTED_SALARIES);
        assert_eq!(report.results.len(), MAX_EXPECTED_SALARIES);
        assert_eq!(report.dropped, 2);
    }

    #[test]
    fn single_salary_gets_single_sentence() {
        let report =
            compare_salaries(&config(), dec!(0), &[dec!(1700000)], &PfPolicy::default()).unwrap();

        assert!(report.summary.starts_with("For AY 2026-27, a CTC of ₹17,00,000"));
        assert_eq!(report.results[0].hike_percent, Decimal::ZERO);
    }

    #[test]
    fn rejects_malformed_configuration() {
        let mut config = config();
        config.slabs.pop();

        assert_eq!(
            compare_salaries(&config, dec!(0), &[dec!(1)], &PfPolicy::default()),
            Err(ConfigurationError::MissingUnboundedSlab)
        );
    }

    #[tokio::test]
    async fn saved_scenario_replays() {
        let repo = MemoryRepository::seeded();
        let saved = save_scenario(
            &repo,
            NewCtcConfiguration {
                assessment_year: "2025-26".to_string(),
                pf_policy: PfPolicy::Fixed(dec!(1800)),
                previous_salary: dec!(1200000),
                expected_salaries: vec![dec!(1400000), dec!(1500000)],
            },
        )
        .await
        .unwrap();

        let (scenario, report) = run_scenario(&repo, saved.version).await.unwrap();

        assert_eq!(scenario, saved);
        assert_eq!(report.assessment_year, "2025-26");
        assert_eq!(report.pf_policy, PfPolicy::Fixed(dec!(1800)));
        assert_eq!(report.baseline.ctc, dec!(1200000));
        assert_eq!(report.options.len(), 2);
    }

    #[tokio::test]
    async fn missing_scenario_is_an_error() {
        let repo = MemoryRepository::seeded();

        let err = run_scenario(&repo, 7).await.unwrap_err();

        assert_eq!(err.to_string(), "failed to load scenario v7");
        assert_eq!(
            err.downcast_ref::<RepositoryError>(),
            Some(&RepositoryError::NotFound)
        );
    }
}
