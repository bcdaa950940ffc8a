use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::IncomeBreakdown;

/// One expected salary measured against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub ctc: Decimal,
    pub net_monthly: Decimal,
    /// CTC increase over the baseline, in percent.
    pub hike_percent: Decimal,
    /// Signed change in monthly take-home pay.
    pub extra_monthly_cash: Decimal,
}

/// Percentage increase from `previous_ctc` to `new_ctc`.
///
/// A non-positive baseline has no meaningful hike and yields zero.
pub fn hike_percent(
    new_ctc: Decimal,
    previous_ctc: Decimal,
) -> Decimal {
    if previous_ctc > Decimal::ZERO {
        (new_ctc - previous_ctc) / previous_ctc * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Measures each breakdown against `baseline`, preserving input order.
pub fn compare(
    breakdowns: &[IncomeBreakdown],
    baseline: &IncomeBreakdown,
) -> Vec<ComparisonResult> {
    breakdowns
        .iter()
        .map(|breakdown| ComparisonResult {
            ctc: breakdown.ctc,
            net_monthly: breakdown.net_monthly,
            hike_percent: hike_percent(breakdown.ctc, baseline.ctc),
            extra_monthly_cash: breakdown.net_monthly - baseline.net_monthly,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::builtin;
    use crate::calculations::TaxEngine;
    use crate::calculations::common::round_half_up;
    use crate::models::PfPolicy;

    fn breakdowns(ctcs: &[Decimal]) -> Vec<IncomeBreakdown> {
        let config = builtin::configuration("2026-27").unwrap();
        let engine = TaxEngine::new(&config).unwrap();
        let pf = PfPolicy::Percentage(dec!(12));
        ctcs.iter()
            .map(|ctc| engine.compute_breakdown(*ctc, &pf))
            .collect()
    }

    #[test]
    fn hike_percent_against_positive_baseline() {
        assert_eq!(
            round_half_up(hike_percent(dec!(1700000), dec!(1500000))),
            dec!(13.33)
        );
        assert_eq!(hike_percent(dec!(1200000), dec!(1000000)), dec!(20));
    }

    #[test]
    fn hike_percent_can_be_negative() {
        assert_eq!(hike_percent(dec!(900000), dec!(1000000)), dec!(-10));
    }

    #[test]
    fn hike_percent_is_zero_for_zero_baseline() {
        assert_eq!(hike_percent(dec!(1700000), dec!(0)), dec!(0));
        assert_eq!(hike_percent(dec!(1700000), dec!(-5)), dec!(0));
    }

    #[test]
    fn compare_reports_signed_extra_cash_in_order() {
        let all = breakdowns(&[dec!(1500000), dec!(1700000), dec!(1400000)]);
        let baseline = &all[0];

        let results = compare(&all[1..], baseline);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].ctc, dec!(1700000));
        assert!(results[0].extra_monthly_cash > Decimal::ZERO);
        assert_eq!(
            results[0].extra_monthly_cash,
            all[1].net_monthly - baseline.net_monthly
        );
        assert_eq!(results[1].ctc, dec!(1400000));
        assert!(results[1].extra_monthly_cash < Decimal::ZERO);
        assert!(results[1].hike_percent < Decimal::ZERO);
    }

    #[test]
    fn comparing_baseline_with_itself_is_neutral() {
        let all = breakdowns(&[dec!(1500000)]);

        let results = compare(&all, &all[0]);

        assert_eq!(results[0].hike_percent, dec!(0));
        assert_eq!(results[0].extra_monthly_cash, dec!(0));
    }

    #[test]
    fn compare_of_nothing_is_empty() {
        let all = breakdowns(&[dec!(1500000)]);

        assert!(compare(&[], &all[0]).is_empty());
    }
}
