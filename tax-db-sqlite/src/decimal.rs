use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};
use tax_core::RepositoryError;

/// Reads a decimal column.
///
/// Amounts are written as TEXT, but INTEGER and REAL cells (hand-edited
/// databases, numeric literals in seed files) are accepted too. NULL reads
/// as zero.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{column}' not found: {e}")))?;

    let type_name = value_ref.type_info().name().to_string();

    match type_name.as_str() {
        "TEXT" => {
            let text: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{column}': {e}"))
            })?;
            Decimal::from_str(text.trim()).map_err(|e| {
                RepositoryError::Database(format!(
                    "Column '{column}' holds '{text}', not a decimal: {e}"
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get INTEGER from '{column}': {e}"))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{column}': {e}"))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {val} to Decimal: {e}"))
            })
        }
        "NULL" => Ok(Decimal::ZERO),
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{other}' for column '{column}'"
        ))),
    }
}

/// Like [`get_decimal`], but NULL reads as `None`.
pub fn get_optional_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{column}' not found: {e}")))?;

    if value_ref.is_null() {
        return Ok(None);
    }

    get_decimal(row, column).map(Some)
}

/// Storage form of a decimal; exact, unlike REAL.
pub fn decimal_to_text(d: Decimal) -> String {
    d.to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query(
            "CREATE TABLE amounts (
                id INTEGER PRIMARY KEY,
                text_value TEXT,
                int_value INTEGER,
                real_value REAL,
                blob_value BLOB
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");
        pool
    }

    async fn fetch(
        pool: &SqlitePool,
        insert: &str,
    ) -> SqliteRow {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        sqlx::query("SELECT * FROM amounts WHERE id = 1")
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    #[tokio::test]
    async fn reads_text_exactly() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO amounts (id, text_value) VALUES (1, '0.15')").await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(0.15)));
    }

    #[tokio::test]
    async fn reads_integer() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO amounts (id, int_value) VALUES (1, 1200000)").await;

        assert_eq!(get_decimal(&row, "int_value"), Ok(dec!(1200000)));
    }

    #[tokio::test]
    async fn reads_real() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO amounts (id, real_value) VALUES (1, 0.04)").await;

        assert_eq!(get_decimal(&row, "real_value"), Ok(dec!(0.04)));
    }

    #[tokio::test]
    async fn null_is_zero_or_none() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO amounts (id) VALUES (1)").await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(Decimal::ZERO));
        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(None));
    }

    #[tokio::test]
    async fn optional_reads_present_value() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO amounts (id, text_value) VALUES (1, '2400000')").await;

        assert_eq!(
            get_optional_decimal(&row, "text_value"),
            Ok(Some(dec!(2400000)))
        );
    }

    #[tokio::test]
    async fn rejects_non_numeric_text() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO amounts (id, text_value) VALUES (1, 'lots')").await;

        assert!(matches!(
            get_decimal(&row, "text_value"),
            Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'text_value' holds 'lots'")
        ));
    }

    #[tokio::test]
    async fn rejects_blob() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO amounts (id, blob_value) VALUES (1, x'00')").await;

        assert_eq!(
            get_decimal(&row, "blob_value"),
            Err(RepositoryError::Database(
                "Unexpected type 'BLOB' for column 'blob_value'".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn missing_column_is_reported() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO amounts (id) VALUES (1)").await;

        assert!(matches!(
            get_optional_decimal(&row, "nope"),
            Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'nope' not found:")
        ));
    }

    #[test]
    fn text_form_keeps_scale() {
        assert_eq!(decimal_to_text(dec!(0.10)), "0.10");
        assert_eq!(decimal_to_text(dec!(-1800)), "-1800");
    }
}
