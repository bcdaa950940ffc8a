//! New-regime slab configurations shipped with the crate.
//!
//! These mirror the SQL seeds of the SQLite backend and back the in-memory
//! repository.

use rust_decimal::Decimal;

use crate::models::{RebateRule, Regime, TaxSlab, TaxSlabConfiguration};

pub const DEFAULT_ASSESSMENT_YEAR: &str = "2026-27";

/// All built-in configurations, oldest year first.
pub fn configurations() -> Vec<TaxSlabConfiguration> {
    vec![ay_2023_24(), ay_2024_25(), ay_2025_26(), ay_2026_27()]
}

/// Built-in configuration for `assessment_year`, if shipped.
pub fn configuration(assessment_year: &str) -> Option<TaxSlabConfiguration> {
    configurations()
        .into_iter()
        .find(|c| c.assessment_year == assessment_year)
}

fn rupees(amount: i64) -> Decimal {
    Decimal::from(amount)
}

/// Rate from whole percent.
fn pct(percent: i64) -> Decimal {
    Decimal::new(percent, 2)
}

fn new_regime(
    assessment_year: &str,
    standard_deduction: i64,
    slabs: Vec<TaxSlab>,
    rebate_amount: i64,
    rebate_threshold: i64,
) -> TaxSlabConfiguration {
    TaxSlabConfiguration {
        assessment_year: assessment_year.to_string(),
        regime: Regime::New,
        standard_deduction: rupees(standard_deduction),
        cess_rate: pct(4),
        slabs,
        rebate: Some(RebateRule {
            amount: rupees(rebate_amount),
            income_threshold: rupees(rebate_threshold),
        }),
    }
}

fn ay_2023_24() -> TaxSlabConfiguration {
    new_regime(
        "2023-24",
        0,
        vec![
            TaxSlab::bounded(rupees(250_000), pct(0)),
            TaxSlab::bounded(rupees(500_000), pct(5)),
            TaxSlab::bounded(rupees(750_000), pct(10)),
            TaxSlab::bounded(rupees(1_000_000), pct(15)),
            TaxSlab::bounded(rupees(1_250_000), pct(20)),
            TaxSlab::bounded(rupees(1_500_000), pct(25)),
            TaxSlab::unbounded(pct(30)),
        ],
        12_500,
        500_000,
    )
}

fn slabs_2024() -> Vec<TaxSlab> {
    vec![
        TaxSlab::bounded(rupees(300_000), pct(0)),
        TaxSlab::bounded(rupees(600_000), pct(5)),
        TaxSlab::bounded(rupees(900_000), pct(10)),
        TaxSlab::bounded(rupees(1_200_000), pct(15)),
        TaxSlab::bounded(rupees(1_500_000), pct(20)),
        TaxSlab::unbounded(pct(30)),
    ]
}

fn ay_2024_25() -> TaxSlabConfiguration {
    new_regime("2024-25", 50_000, slabs_2024(), 25_000, 700_000)
}

fn ay_2025_26() -> TaxSlabConfiguration {
    new_regime("2025-26", 50_000, slabs_2024(), 25_000, 700_000)
}

fn ay_2026_27() -> TaxSlabConfiguration {
    new_regime(
        "2026-27",
        75_000,
        vec![
            TaxSlab::bounded(rupees(400_000), pct(0)),
            TaxSlab::bounded(rupees(800_000), pct(5)),
            TaxSlab::bounded(rupees(1_200_000), pct(10)),
            TaxSlab::bounded(rupees(1_600_000), pct(15)),
            TaxSlab::bounded(rupees(2_000_000), pct(20)),
            TaxSlab::bounded(rupees(2_400_000), pct(25)),
            TaxSlab::unbounded(pct(30)),
        ],
        60_000,
        1_200_000,
    )
}
