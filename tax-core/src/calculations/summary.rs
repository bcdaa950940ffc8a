//! Natural-language and structured summaries of salary breakdowns.
//!
//! All output is deterministic for a given input. The structured summary
//! takes its timestamp from the caller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{round_half_up, round_to_rupee};
use crate::calculations::format::{format_lakhs, format_percent, format_rupees};
use crate::models::{IncomeBreakdown, Regime};

/// Describes a single salary.
pub fn salary_summary(
    breakdown: &IncomeBreakdown,
    assessment_year: &str,
) -> String {
    format!(
        "For AY {assessment_year}, a CTC of {} results in an in-hand monthly salary of {}. \
         This accounts for an annual tax liability of {} (effective rate: {}), \
         monthly PF deduction of {}, and monthly tax deduction of {}. \
         The gross monthly income before deductions is {}.",
        format_rupees(breakdown.ctc),
        format_rupees(breakdown.net_monthly),
        format_rupees(breakdown.total_tax_annual),
        format_percent(breakdown.effective_tax_rate(), 2),
        format_rupees(breakdown.employee_pf_monthly),
        format_rupees(breakdown.tax_monthly),
        format_rupees(breakdown.gross_monthly),
    )
}

/// Describes one or more salaries.
///
/// Several breakdowns are listed as numbered options followed by the spread
/// between the lowest and highest monthly take-home pay.
pub fn summarize(
    breakdowns: &[IncomeBreakdown],
    assessment_year: &str,
) -> String {
    match breakdowns {
        [] => String::new(),
        [single] => salary_summary(single, assessment_year),
        _ => comparison_summary(breakdowns, assessment_year),
    }
}

fn comparison_summary(
    breakdowns: &[IncomeBreakdown],
    assessment_year: &str,
) -> String {
    let options: Vec<String> = breakdowns
        .iter()
        .enumerate()
        .map(|(idx, b)| {
            format!(
                "Option {}: CTC {} → In-hand {}/month (Tax: {}/year, {} effective rate)",
                idx + 1,
                format_rupees(b.ctc),
                format_rupees(b.net_monthly),
                format_rupees(b.total_tax_annual),
                format_percent(b.effective_tax_rate(), 1),
            )
        })
        .collect();

    format!(
        "India Income Tax Calculator for AY {assessment_year} (New Regime). \
         Comparing {} salary options: {}. \
         The difference in monthly in-hand salary between lowest and highest options is {}.",
        breakdowns.len(),
        options.join("; "),
        format_rupees(in_hand_spread(breakdowns)),
    )
}

fn in_hand_spread(breakdowns: &[IncomeBreakdown]) -> Decimal {
    let mut net = breakdowns.iter().map(|b| b.net_monthly);
    let Some(first) = net.next() else {
        return Decimal::ZERO;
    };
    let (min, max) = net.fold((first, first), |(min, max), value| {
        (min.min(value), max.max(value))
    });
    max - min
}

/// Machine-readable summary of a set of breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSummary {
    pub assessment_year: String,
    pub regime: Regime,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub calculations: Vec<SummaryRow>,
}

/// One breakdown, rounded to the rupee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub ctc: Decimal,
    pub gross_monthly: Decimal,
    pub monthly_tax: Decimal,
    #[serde(rename = "monthlyPF")]
    pub monthly_pf: Decimal,
    pub in_hand_monthly: Decimal,
    pub annual_tax: Decimal,
    /// Two decimals.
    pub effective_tax_rate: Decimal,
}

impl From<&IncomeBreakdown> for SummaryRow {
    fn from(b: &IncomeBreakdown) -> Self {
        Self {
            ctc: round_to_rupee(b.ctc),
            gross_monthly: round_to_rupee(b.gross_monthly),
            monthly_tax: round_to_rupee(b.tax_monthly),
            monthly_pf: round_to_rupee(b.employee_pf_monthly),
            in_hand_monthly: round_to_rupee(b.net_monthly),
            annual_tax: round_to_rupee(b.total_tax_annual),
            effective_tax_rate: round_half_up(b.effective_tax_rate()),
        }
    }
}

pub fn structured_summary(
    breakdowns: &[IncomeBreakdown],
    assessment_year: &str,
    regime: Regime,
    generated_at: DateTime<Utc>,
) -> StructuredSummary {
    StructuredSummary {
        assessment_year: assessment_year.to_string(),
        regime,
        timestamp: generated_at,
        summary: summarize(breakdowns, assessment_year),
        calculations: breakdowns.iter().map(SummaryRow::from).collect(),
    }
}

/// One-line description of a CTC range.
pub fn meta_description(
    min_ctc: Decimal,
    max_ctc: Decimal,
    assessment_year: &str,
) -> String {
    format!(
        "Calculate in-hand salary for CTC ranging from {} to {} under India's new tax regime \
         (AY {assessment_year}). Includes Section 87A rebate, 4% cess, PF deductions, \
         and detailed tax breakdown by slab.",
        format_lakhs(min_ctc),
        format_lakhs(max_ctc),
    )
}
