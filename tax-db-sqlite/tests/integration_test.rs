use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_core::db::{DbConfig, RepositoryRegistry};
use tax_core::{NewCtcConfiguration, PfPolicy, Regime, TaxEngine};
use tax_db_sqlite::SqliteRepositoryFactory;

fn registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

#[tokio::test]
async fn seeded_year_reproduces_worked_example() {
    let repo = registry()
        .create(&DbConfig::sqlite(":memory:"))
        .await
        .expect("Should open sqlite repository");

    let config = repo
        .get_configuration("2026-27", Regime::New)
        .await
        .expect("2026-27 should be seeded");
    let engine = TaxEngine::new(&config).expect("seeded configuration should be valid");
    let breakdown = engine.compute_breakdown(dec!(1700000), &PfPolicy::Percentage(dec!(12)));

    assert_eq!(breakdown.taxable_income, dec!(1421000));
    assert_eq!(breakdown.slab_tax_total, dec!(93150));
    assert_eq!(breakdown.cess, dec!(3726));
    assert_eq!(breakdown.total_tax_annual, dec!(96876));
}

#[tokio::test]
async fn saved_scenario_survives_a_round_trip() {
    let repo = registry()
        .create(&DbConfig::sqlite(":memory:"))
        .await
        .expect("Should open sqlite repository");

    let saved = repo
        .save(NewCtcConfiguration {
            assessment_year: "2025-26".to_string(),
            pf_policy: PfPolicy::Percentage(dec!(12)),
            previous_salary: dec!(1200000),
            expected_salaries: vec![dec!(1400000), dec!(1500000), dec!(1600000)],
        })
        .await
        .expect("Should save scenario");

    let latest = repo
        .get_latest()
        .await
        .expect("Should query latest")
        .expect("A scenario was saved");

    assert_eq!(latest.version, saved.version);
    assert_eq!(latest.expected_salaries, saved.expected_salaries);
    assert_eq!(latest.pf_policy, saved.pf_policy);
}
