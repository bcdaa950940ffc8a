use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tax_core::{
    AssessmentYear, CtcConfiguration, NewCtcConfiguration, PfPolicy, RebateRule, Regime,
    RepositoryError, ScenarioStore, ScenarioVersion, SlabLimit, TaxRepository, TaxSlab,
    TaxSlabConfiguration,
};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// In-memory databases live in a single connection that is never
    /// recycled; each extra connection would see an empty database.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {database_url}"))?;
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Executes every `.sql` file in `seeds_dir`, in file-name order.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            info!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, RepositoryError> {
        self.pool.begin().await.map_err(db_error)
    }

    async fn load_slabs(
        &self,
        configuration_id: i64,
    ) -> Result<Vec<TaxSlab>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT up_to, rate FROM tax_slab WHERE configuration_id = ? ORDER BY position",
        )
        .bind(configuration_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                Ok(TaxSlab {
                    up_to: SlabLimit::from(get_optional_decimal(row, "up_to")?),
                    rate: get_decimal(row, "rate")?,
                })
            })
            .collect()
    }

    async fn load_salaries(
        &self,
        version: i64,
    ) -> Result<Vec<rust_decimal::Decimal>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT amount FROM ctc_expected_salary WHERE version = ? ORDER BY position",
        )
        .bind(version)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(|row| get_decimal(row, "amount")).collect()
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn get_string(
    row: &SqliteRow,
    column: &str,
) -> Result<String, RepositoryError> {
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {column}: {e}")))
}

fn get_i64(
    row: &SqliteRow,
    column: &str,
) -> Result<i64, RepositoryError> {
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {column}: {e}")))
}

fn get_timestamp(
    row: &SqliteRow,
    column: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    row.try_get::<DateTime<Utc>, _>(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {column}: {e}")))
}

fn row_to_rebate(row: &SqliteRow) -> Result<Option<RebateRule>, RepositoryError> {
    let amount = get_optional_decimal(row, "rebate_amount")?;
    let income_threshold = get_optional_decimal(row, "rebate_income_threshold")?;
    match (amount, income_threshold) {
        (Some(amount), Some(income_threshold)) => Ok(Some(RebateRule {
            amount,
            income_threshold,
        })),
        (None, None) => Ok(None),
        _ => Err(RepositoryError::Database(
            "rebate amount and income threshold must both be set or both be NULL".to_string(),
        )),
    }
}

fn row_to_pf_policy(row: &SqliteRow) -> Result<PfPolicy, RepositoryError> {
    let mode = get_string(row, "pf_mode")?;
    let value = get_decimal(row, "pf_value")?;
    PfPolicy::from_parts(&mode, value)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid PF mode: {mode}")))
}

async fn delete_configuration_rows(
    tx: &mut Transaction<'static, Sqlite>,
    assessment_year: &str,
    regime: Regime,
) -> Result<u64, RepositoryError> {
    sqlx::query(
        "DELETE FROM tax_slab WHERE configuration_id IN (
             SELECT id FROM tax_slab_configuration WHERE assessment_year = ? AND regime = ?
         )",
    )
    .bind(assessment_year)
    .bind(regime.as_str())
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;

    let result = sqlx::query(
        "DELETE FROM tax_slab_configuration WHERE assessment_year = ? AND regime = ?",
    )
    .bind(assessment_year)
    .bind(regime.as_str())
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;

    Ok(result.rows_affected())
}

#[async_trait]
impl TaxRepository for SqliteRepository {
    async fn get_configuration(
        &self,
        assessment_year: &str,
        regime: Regime,
    ) -> Result<TaxSlabConfiguration, RepositoryError> {
        debug!(assessment_year, %regime, "looking up slab configuration");

        let row = sqlx::query(
            "SELECT id, standard_deduction, cess_rate, rebate_amount, rebate_income_threshold
             FROM tax_slab_configuration WHERE assessment_year = ? AND regime = ?",
        )
        .bind(assessment_year)
        .bind(regime.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        let id = get_i64(&row, "id")?;

        Ok(TaxSlabConfiguration {
            assessment_year: assessment_year.to_string(),
            regime,
            standard_deduction: get_decimal(&row, "standard_deduction")?,
            cess_rate: get_decimal(&row, "cess_rate")?,
            slabs: self.load_slabs(id).await?,
            rebate: row_to_rebate(&row)?,
        })
    }

    async fn list_assessment_years(
        &self,
        regime: Regime,
    ) -> Result<Vec<AssessmentYear>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT DISTINCT assessment_year FROM tax_slab_configuration WHERE regime = ?",
        )
        .bind(regime.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut years = rows
            .iter()
            .map(|row| get_string(row, "assessment_year").map(AssessmentYear::new))
            .collect::<Result<Vec<_>, _>>()?;
        AssessmentYear::sort_newest_first(&mut years);
        Ok(years)
    }

    async fn replace_configuration(
        &self,
        config: &TaxSlabConfiguration,
    ) -> Result<(), RepositoryError> {
        config.validate()?;

        let mut tx = self.begin().await?;
        delete_configuration_rows(&mut tx, &config.assessment_year, config.regime).await?;

        let id = sqlx::query(
            "INSERT INTO tax_slab_configuration (
                assessment_year, regime, standard_deduction, cess_rate,
                rebate_amount, rebate_income_threshold
            ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&config.assessment_year)
        .bind(config.regime.as_str())
        .bind(decimal_to_text(config.standard_deduction))
        .bind(decimal_to_text(config.cess_rate))
        .bind(config.rebate.map(|r| decimal_to_text(r.amount)))
        .bind(config.rebate.map(|r| decimal_to_text(r.income_threshold)))
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .last_insert_rowid();

        for (position, slab) in config.slabs.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tax_slab (configuration_id, position, up_to, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(position as i64)
            .bind(slab.up_to.amount().map(decimal_to_text))
            .bind(decimal_to_text(slab.rate))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        debug!(
            assessment_year = %config.assessment_year,
            slabs = config.slabs.len(),
            "replaced slab configuration"
        );
        Ok(())
    }

    async fn delete_configuration(
        &self,
        assessment_year: &str,
        regime: Regime,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;
        let deleted = delete_configuration_rows(&mut tx, assessment_year, regime).await?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl ScenarioStore for SqliteRepository {
    async fn save(
        &self,
        scenario: NewCtcConfiguration,
    ) -> Result<CtcConfiguration, RepositoryError> {
        let mut tx = self.begin().await?;

        let version: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) + 1 FROM ctc_configuration")
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
        let saved = scenario.into_saved(version, Utc::now());

        sqlx::query(
            "INSERT INTO ctc_configuration (
                version, saved_at, assessment_year, pf_mode, pf_value, previous_salary
            ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(saved.version)
        .bind(saved.saved_at)
        .bind(&saved.assessment_year)
        .bind(saved.pf_policy.mode())
        .bind(decimal_to_text(saved.pf_policy.value()))
        .bind(decimal_to_text(saved.previous_salary))
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        for (position, amount) in saved.expected_salaries.iter().enumerate() {
            sqlx::query(
                "INSERT INTO ctc_expected_salary (version, position, amount) VALUES (?, ?, ?)",
            )
            .bind(saved.version)
            .bind(position as i64)
            .bind(decimal_to_text(*amount))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        debug!(version = saved.version, "saved scenario");
        Ok(saved)
    }

    async fn get(
        &self,
        version: i64,
    ) -> Result<CtcConfiguration, RepositoryError> {
        let row = sqlx::query(
            "SELECT version, saved_at, assessment_year, pf_mode, pf_value, previous_salary
             FROM ctc_configuration WHERE version = ?",
        )
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(CtcConfiguration {
            version: get_i64(&row, "version")?,
            saved_at: get_timestamp(&row, "saved_at")?,
            assessment_year: get_string(&row, "assessment_year")?,
            pf_policy: row_to_pf_policy(&row)?,
            previous_salary: get_decimal(&row, "previous_salary")?,
            expected_salaries: self.load_salaries(version).await?,
        })
    }

    async fn get_latest(&self) -> Result<Option<CtcConfiguration>, RepositoryError> {
        let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM ctc_configuration")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        match latest {
            Some(version) => self.get(version).await.map(Some),
            None => Ok(None),
        }
    }

    async fn delete(
        &self,
        version: i64,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;

        sqlx::query("DELETE FROM ctc_expected_salary WHERE version = ?")
            .bind(version)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        let result = sqlx::query("DELETE FROM ctc_configuration WHERE version = ?")
            .bind(version)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn list_versions(&self) -> Result<Vec<ScenarioVersion>, RepositoryError> {
        let rows =
            sqlx::query("SELECT version, saved_at FROM ctc_configuration ORDER BY version DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                Ok(ScenarioVersion {
                    version: get_i64(row, "version")?,
                    saved_at: get_timestamp(row, "saved_at")?,
                })
            })
            .collect()
    }

    async fn clear_all(&self) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM ctc_expected_salary")
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        sqlx::query("DELETE FROM ctc_configuration")
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::{ConfigurationError, builtin};

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let repo = SqliteRepository::new_with_pool(pool);
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    async fn seeded_test_db() -> SqliteRepository {
        let repo = setup_test_db().await;
        repo.run_seeds(&Path::new(env!("CARGO_MANIFEST_DIR")).join("seeds"))
            .await
            .expect("Should run seeds successfully");
        repo
    }

    fn scenario(previous: rust_decimal::Decimal) -> NewCtcConfiguration {
        NewCtcConfiguration {
            assessment_year: "2026-27".to_string(),
            pf_policy: PfPolicy::Fixed(dec!(1800)),
            previous_salary: previous,
            expected_salaries: vec![dec!(1700000), dec!(1850000.50)],
        }
    }

    // ── slab configurations ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_seeds_match_builtin_configurations() {
        let repo = seeded_test_db().await;

        for expected in builtin::configurations() {
            let stored = repo
                .get_configuration(&expected.assessment_year, Regime::New)
                .await
                .expect("Should find seeded year");
            assert_eq!(stored, expected);
        }
    }

    #[tokio::test]
    async fn test_run_seeds_twice_is_harmless() {
        let repo = seeded_test_db().await;

        repo.run_seeds(&Path::new(env!("CARGO_MANIFEST_DIR")).join("seeds"))
            .await
            .expect("Should re-run seeds");

        let config = repo.get_configuration("2026-27", Regime::New).await.unwrap();
        assert_eq!(config.slabs.len(), 7);
    }

    #[tokio::test]
    async fn test_run_seeds_nonexistent_directory() {
        let repo = setup_test_db().await;

        let err = repo
            .run_seeds(Path::new("./nonexistent"))
            .await
            .expect_err("Should fail for nonexistent directory");

        assert_eq!(
            err.to_string(),
            "Failed to read seeds directory './nonexistent'"
        );
    }

    #[tokio::test]
    async fn test_get_configuration_not_found() {
        let repo = setup_test_db().await;

        assert_eq!(
            repo.get_configuration("2026-27", Regime::New).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_list_assessment_years_newest_first() {
        let repo = seeded_test_db().await;

        let years = repo.list_assessment_years(Regime::New).await.unwrap();

        assert_eq!(
            years,
            vec![
                AssessmentYear::new("2026-27"),
                AssessmentYear::new("2025-26"),
                AssessmentYear::new("2024-25"),
                AssessmentYear::new("2023-24"),
            ]
        );
    }

    #[tokio::test]
    async fn test_replace_configuration_round_trips() {
        let repo = setup_test_db().await;
        let config = TaxSlabConfiguration {
            assessment_year: "2027-28".to_string(),
            regime: Regime::New,
            standard_deduction: dec!(75000),
            cess_rate: dec!(0.04),
            slabs: vec![
                TaxSlab::bounded(dec!(500000), dec!(0)),
                TaxSlab::unbounded(dec!(0.125)),
            ],
            rebate: None,
        };

        repo.replace_configuration(&config).await.unwrap();

        assert_eq!(
            repo.get_configuration("2027-28", Regime::New).await,
            Ok(config)
        );
    }

    #[tokio::test]
    async fn test_replace_configuration_overwrites_slabs() {
        let repo = seeded_test_db().await;
        let mut config = builtin::configuration("2026-27").unwrap();
        config.slabs = vec![
            TaxSlab::bounded(dec!(1000000), dec!(0)),
            TaxSlab::unbounded(dec!(0.2)),
        ];

        repo.replace_configuration(&config).await.unwrap();

        let stored = repo.get_configuration("2026-27", Regime::New).await.unwrap();
        assert_eq!(stored.slabs, config.slabs);
        assert_eq!(repo.list_assessment_years(Regime::New).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_replace_configuration_rejects_invalid() {
        let repo = seeded_test_db().await;
        let mut config = builtin::configuration("2026-27").unwrap();
        config.slabs.remove(0);
        config.slabs.insert(1, TaxSlab::bounded(dec!(100), dec!(0.05)));

        let result = repo.replace_configuration(&config).await;

        assert!(matches!(
            result,
            Err(RepositoryError::InvalidConfiguration(
                ConfigurationError::NotAscending { index: 1, .. }
            ))
        ));
        let untouched = repo.get_configuration("2026-27", Regime::New).await.unwrap();
        assert_eq!(untouched, builtin::configuration("2026-27").unwrap());
    }

    #[tokio::test]
    async fn test_delete_configuration() {
        let repo = seeded_test_db().await;

        repo.delete_configuration("2023-24", Regime::New).await.unwrap();

        assert_eq!(
            repo.get_configuration("2023-24", Regime::New).await,
            Err(RepositoryError::NotFound)
        );
        assert_eq!(
            repo.delete_configuration("2023-24", Regime::New).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_half_set_rebate_is_a_database_error() {
        let repo = seeded_test_db().await;
        sqlx::query(
            "UPDATE tax_slab_configuration SET rebate_amount = NULL WHERE assessment_year = '2024-25'",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        assert!(matches!(
            repo.get_configuration("2024-25", Regime::New).await,
            Err(RepositoryError::Database(_))
        ));
    }

    // ── scenarios ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_save_and_get_scenario() {
        let repo = setup_test_db().await;

        let saved = repo.save(scenario(dec!(1500000))).await.unwrap();
        let loaded = repo.get(saved.version).await.unwrap();

        assert_eq!(saved.version, 1);
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.assessment_year, "2026-27");
        assert_eq!(loaded.pf_policy, PfPolicy::Fixed(dec!(1800)));
        assert_eq!(loaded.previous_salary, dec!(1500000));
        assert_eq!(loaded.expected_salaries, vec![dec!(1700000), dec!(1850000.50)]);
    }

    #[tokio::test]
    async fn test_save_truncates_to_five_salaries() {
        let repo = setup_test_db().await;
        let mut new = scenario(dec!(1500000));
        new.expected_salaries = (1..=7).map(rust_decimal::Decimal::from).collect();

        let saved = repo.save(new).await.unwrap();

        assert_eq!(
            repo.get(saved.version).await.unwrap().expected_salaries,
            vec![dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]
        );
    }

    #[tokio::test]
    async fn test_versions_and_latest() {
        let repo = setup_test_db().await;
        assert_eq!(repo.get_latest().await, Ok(None));

        for n in 1..=3 {
            repo.save(scenario(rust_decimal::Decimal::from(n))).await.unwrap();
        }
        repo.delete(2).await.unwrap();

        let versions: Vec<_> = repo
            .list_versions()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(versions, vec![3, 1]);

        let latest = repo.get_latest().await.unwrap().unwrap();
        assert_eq!(latest.version, 3);
        assert_eq!(latest.previous_salary, dec!(3));

        assert_eq!(repo.save(scenario(dec!(4))).await.unwrap().version, 4);
    }

    #[tokio::test]
    async fn test_missing_scenario_not_found() {
        let repo = setup_test_db().await;

        assert_eq!(repo.get(42).await, Err(RepositoryError::NotFound));
        assert_eq!(repo.delete(42).await, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_clear_all_restarts_versions() {
        let repo = setup_test_db().await;
        repo.save(scenario(dec!(1))).await.unwrap();
        repo.save(scenario(dec!(2))).await.unwrap();

        repo.clear_all().await.unwrap();

        assert!(repo.list_versions().await.unwrap().is_empty());
        assert_eq!(repo.save(scenario(dec!(3))).await.unwrap().version, 1);
        assert_eq!(repo.get(1).await.unwrap().expected_salaries.len(), 2);
    }
}
