use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{
    ConfigurationError, RebateRule, Regime, RepositoryError, SlabLimit, TaxRepository, TaxSlab,
    TaxSlabConfiguration,
};
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading slab configurations.
#[derive(Debug, Error, PartialEq)]
pub enum SlabLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown regime '{0}'")]
    UnknownRegime(String),

    #[error("Rows for AY {assessment_year} disagree on {field}")]
    InconsistentConfiguration {
        assessment_year: String,
        field: &'static str,
    },

    #[error("AY {assessment_year} sets only one of rebate_amount and rebate_income_threshold")]
    IncompleteRebate { assessment_year: String },

    #[error("AY {assessment_year}: {source}")]
    InvalidConfiguration {
        assessment_year: String,
        source: ConfigurationError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for SlabLoaderError {
    fn from(err: csv::Error) -> Self {
        SlabLoaderError::CsvParse(err.to_string())
    }
}

/// One slab row of the CSV file.
///
/// The configuration-level columns repeat on every row of a year:
///
/// | column                    | example   | notes                        |
/// |---------------------------|-----------|------------------------------|
/// | `assessment_year`         | `2026-27` |                              |
/// | `regime`                  | `new`     |                              |
/// | `standard_deduction`      | `75000`   |                              |
/// | `cess_rate`               | `0.04`    | fraction                     |
/// | `rebate_amount`           | `60000`   | empty for no rebate          |
/// | `rebate_income_threshold` | `1200000` | empty for no rebate          |
/// | `up_to`                   | `400000`  | empty for the unbounded slab |
/// | `rate`                    | `0.05`    | fraction                     |
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SlabRecord {
    pub assessment_year: String,
    pub regime: String,
    pub standard_deduction: Decimal,
    pub cess_rate: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub rebate_amount: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub rebate_income_threshold: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub up_to: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Reads slab configurations from CSV and writes them through any
/// [`TaxRepository`].
pub struct SlabConfigurationLoader;

impl SlabConfigurationLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SlabRecord>, SlabLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: SlabRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Groups rows into configurations, one per year and regime.
    ///
    /// Slabs keep their row order. Every configuration is validated before
    /// it is returned.
    pub fn build(records: &[SlabRecord]) -> Result<Vec<TaxSlabConfiguration>, SlabLoaderError> {
        let mut groups: BTreeMap<(String, Regime), Vec<&SlabRecord>> = BTreeMap::new();

        for record in records {
            let regime = Regime::parse(&record.regime)
                .ok_or_else(|| SlabLoaderError::UnknownRegime(record.regime.clone()))?;
            groups
                .entry((record.assessment_year.trim().to_string(), regime))
                .or_default()
                .push(record);
        }

        groups
            .into_iter()
            .map(|((assessment_year, regime), rows)| {
                build_configuration(assessment_year, regime, &rows)
            })
            .collect()
    }

    /// Replaces each configuration found in `records`.
    ///
    /// Nothing is written unless every configuration is valid. Loading the
    /// same file twice leaves the store unchanged. Returns the number of
    /// configurations written.
    pub async fn load<R: TaxRepository + ?Sized>(
        repo: &R,
        records: &[SlabRecord],
    ) -> Result<usize, SlabLoaderError> {
        let configurations = Self::build(records)?;

        for config in &configurations {
            repo.replace_configuration(config).await?;
            info!(
                assessment_year = %config.assessment_year,
                regime = %config.regime,
                slabs = config.slabs.len(),
                "loaded slab configuration"
            );
        }

        Ok(configurations.len())
    }
}

fn build_configuration(
    assessment_year: String,
    regime: Regime,
    rows: &[&SlabRecord],
) -> Result<TaxSlabConfiguration, SlabLoaderError> {
    let Some(first) = rows.first() else {
        return Err(SlabLoaderError::InvalidConfiguration {
            assessment_year,
            source: ConfigurationError::NoSlabs,
        });
    };

    let inconsistent = |field| SlabLoaderError::InconsistentConfiguration {
        assessment_year: assessment_year.clone(),
        field,
    };
    for row in &rows[1..] {
        if row.standard_deduction != first.standard_deduction {
            return Err(inconsistent("standard_deduction"));
        }
        if row.cess_rate != first.cess_rate {
            return Err(inconsistent("cess_rate"));
        }
        if row.rebate_amount != first.rebate_amount {
            return Err(inconsistent("rebate_amount"));
        }
        if row.rebate_income_threshold != first.rebate_income_threshold {
            return Err(inconsistent("rebate_income_threshold"));
        }
    }

    let rebate = match (first.rebate_amount, first.rebate_income_threshold) {
        (Some(amount), Some(income_threshold)) => Some(RebateRule {
            amount,
            income_threshold,
        }),
        (None, None) => None,
        _ => return Err(SlabLoaderError::IncompleteRebate { assessment_year }),
    };

    let config = TaxSlabConfiguration {
        assessment_year,
        regime,
        standard_deduction: first.standard_deduction,
        cess_rate: first.cess_rate,
        slabs: rows
            .iter()
            .map(|row| TaxSlab {
                up_to: SlabLimit::from(row.up_to),
                rate: row.rate,
            })
            .collect(),
        rebate,
    };

    config
        .validate()
        .map_err(|source| SlabLoaderError::InvalidConfiguration {
            assessment_year: config.assessment_year.clone(),
            source,
        })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "assessment_year,regime,standard_deduction,cess_rate,rebate_amount,rebate_income_threshold,up_to,rate\n";

    fn parse(body: &str) -> Vec<SlabRecord> {
        SlabConfigurationLoader::parse(format!("{HEADER}{body}").as_bytes()).unwrap()
    }

    #[test]
    fn parses_empty_columns_as_none() {
        let records = parse("2027-28,new,75000,0.04,,,,0.3\n");

        assert_eq!(
            records,
            vec![SlabRecord {
                assessment_year: "2027-28".to_string(),
                regime: "new".to_string(),
                standard_deduction: dec!(75000),
                cess_rate: dec!(0.04),
                rebate_amount: None,
                rebate_income_threshold: None,
                up_to: None,
                rate: dec!(0.3),
            }]
        );
    }

    #[test]
    fn rejects_non_numeric_amount() {
        let result = SlabConfigurationLoader::parse(
            format!("{HEADER}2027-28,new,lots,0.04,,,,0.3\n").as_bytes(),
        );

        assert!(matches!(result, Err(SlabLoaderError::CsvParse(_))));
    }

    #[test]
    fn builds_one_configuration_per_year() {
        let records = parse(
            "2027-28,new,75000,0.04,60000,1200000,400000,0\n\
             2027-28,new,75000,0.04,60000,1200000,,0.1\n\
             2026-27,new,75000,0.04,60000,1200000,,0.3\n",
        );

        let configs = SlabConfigurationLoader::build(&records).unwrap();

        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].assessment_year, "2026-27");
        assert_eq!(configs[1].assessment_year, "2027-28");
        assert_eq!(
            configs[1].slabs,
            vec![
                TaxSlab::bounded(dec!(400000), dec!(0)),
                TaxSlab::unbounded(dec!(0.1)),
            ]
        );
        assert_eq!(
            configs[1].rebate,
            Some(RebateRule {
                amount: dec!(60000),
                income_threshold: dec!(1200000),
            })
        );
    }

    #[test]
    fn rejects_unknown_regime() {
        let records = parse("2027-28,old,50000,0.04,,,,0.3\n");

        assert_eq!(
            SlabConfigurationLoader::build(&records),
            Err(SlabLoaderError::UnknownRegime("old".to_string()))
        );
    }

    #[test]
    fn rejects_rows_that_disagree() {
        let records = parse(
            "2027-28,new,75000,0.04,,,400000,0\n\
             2027-28,new,50000,0.04,,,,0.1\n",
        );

        assert_eq!(
            SlabConfigurationLoader::build(&records),
            Err(SlabLoaderError::InconsistentConfiguration {
                assessment_year: "2027-28".to_string(),
                field: "standard_deduction",
            })
        );
    }

    #[test]
    fn rejects_half_a_rebate() {
        let records = parse("2027-28,new,75000,0.04,60000,,,0.3\n");

        assert_eq!(
            SlabConfigurationLoader::build(&records),
            Err(SlabLoaderError::IncompleteRebate {
                assessment_year: "2027-28".to_string(),
            })
        );
    }

    #[test]
    fn rejects_configuration_without_unbounded_slab() {
        let records = parse("2027-28,new,75000,0.04,,,400000,0\n");

        assert_eq!(
            SlabConfigurationLoader::build(&records),
            Err(SlabLoaderError::InvalidConfiguration {
                assessment_year: "2027-28".to_string(),
                source: ConfigurationError::MissingUnboundedSlab,
            })
        );
    }

    #[test]
    fn error_message_names_the_year() {
        let err = SlabLoaderError::InvalidConfiguration {
            assessment_year: "2027-28".to_string(),
            source: ConfigurationError::NoSlabs,
        };

        assert_eq!(err.to_string(), "AY 2027-28: configuration has no tax slabs");
    }
}
