//! Take-home pay under the new tax regime.
//!
//! # Computation order
//!
//! | Step | Figure |
//! |------|--------|
//! | 1    | Employer PF, gross after employer PF, employee PF |
//! | 2    | Taxable income (gross − standard deduction, minimum 0) |
//! | 3    | Slab tax, bracket by bracket |
//! | 4    | Section 87A rebate (cliff at the income threshold) |
//! | 5    | Tax after rebate (minimum 0) |
//! | 6    | Cess on the tax after rebate |
//! | 7    | Annual total, monthly gross / tax / net |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::TaxEngine;
//! use tax_core::{PfPolicy, RebateRule, Regime, TaxSlab, TaxSlabConfiguration};
//!
//! let config = TaxSlabConfiguration {
//!     assessment_year: "2026-27".to_string(),
//!     regime: Regime::New,
//!     standard_deduction: dec!(75000),
//!     cess_rate: dec!(0.04),
//!     slabs: vec![
//!         TaxSlab::bounded(dec!(400000), dec!(0)),
//!         TaxSlab::bounded(dec!(800000), dec!(0.05)),
//!         TaxSlab::bounded(dec!(1200000), dec!(0.10)),
//!         TaxSlab::bounded(dec!(1600000), dec!(0.15)),
//!         TaxSlab::bounded(dec!(2000000), dec!(0.20)),
//!         TaxSlab::bounded(dec!(2400000), dec!(0.25)),
//!         TaxSlab::unbounded(dec!(0.30)),
//!     ],
//!     rebate: Some(RebateRule {
//!         amount: dec!(60000),
//!         income_threshold: dec!(1200000),
//!     }),
//! };
//!
//! let engine = TaxEngine::new(&config).unwrap();
//! let breakdown = engine.compute_breakdown(dec!(1700000), &PfPolicy::Percentage(dec!(12)));
//!
//! assert_eq!(breakdown.employer_pf_monthly, dec!(17000));
//! assert_eq!(breakdown.taxable_income, dec!(1421000));
//! assert_eq!(breakdown.slab_tax_total, dec!(93150));
//! assert_eq!(breakdown.total_tax_annual, dec!(96876));
//! ```

use rust_decimal::Decimal;
use tracing::{trace, warn};

use crate::calculations::common::{annual, max, monthly, percent_of, round_to_rupee};
use crate::models::{
    ConfigurationError, IncomeBreakdown, PfPolicy, SlabLimit, SlabLine, TaxSlabConfiguration,
};

/// Largest CTC or monthly PF amount, either sign, a breakdown is computed for.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Largest PF percentage, either sign, a breakdown is computed for.
pub const MAX_PF_PERCENT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Whether a breakdown for these inputs stays inside `Decimal` range.
///
/// Inputs past [`MAX_AMOUNT`] or [`MAX_PF_PERCENT`] can overflow and panic;
/// callers taking amounts from users check this first.
pub fn within_limits(
    annual_compensation: Decimal,
    pf_policy: &PfPolicy,
) -> bool {
    let pf_limit = match pf_policy {
        PfPolicy::Percentage(_) => MAX_PF_PERCENT,
        PfPolicy::Fixed(_) => MAX_AMOUNT,
    };
    annual_compensation.abs() <= MAX_AMOUNT && pf_policy.value().abs() <= pf_limit
}

/// Validates `config` and computes the breakdown for one CTC.
///
/// Inputs must satisfy [`within_limits`].
pub fn compute_breakdown(
    annual_compensation: Decimal,
    pf_policy: &PfPolicy,
    config: &TaxSlabConfiguration,
) -> Result<IncomeBreakdown, ConfigurationError> {
    Ok(TaxEngine::new(config)?.compute_breakdown(annual_compensation, pf_policy))
}

/// Provident-fund figures derived from the CTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PfSplit {
    employer_monthly: Decimal,
    employee_monthly: Decimal,
    gross_annual: Decimal,
}

/// Tax calculator bound to one validated slab configuration.
///
/// Holding a `TaxEngine` means the configuration has passed
/// [`TaxSlabConfiguration::validate`], so computing a breakdown cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct TaxEngine<'a> {
    config: &'a TaxSlabConfiguration,
}

impl<'a> TaxEngine<'a> {
    pub fn new(config: &'a TaxSlabConfiguration) -> Result<Self, ConfigurationError> {
        if let Err(error) = config.validate() {
            warn!(
                assessment_year = %config.assessment_year,
                regime = %config.regime,
                %error,
                "rejected tax slab configuration"
            );
            return Err(error);
        }
        Ok(Self { config })
    }

    pub fn configuration(&self) -> &'a TaxSlabConfiguration {
        self.config
    }

    /// Computes the full breakdown for `annual_compensation`.
    ///
    /// Degenerate inputs (zero or negative CTC, PF above the CTC) produce
    /// whatever the formulas yield; see [`IncomeBreakdown::warnings`].
    /// Inputs must satisfy [`within_limits`].
    pub fn compute_breakdown(
        &self,
        annual_compensation: Decimal,
        pf_policy: &PfPolicy,
    ) -> IncomeBreakdown {
        let pf = self.provident_fund(annual_compensation, pf_policy);
        let taxable_income = self.taxable_income(pf.gross_annual);
        let (slab_lines, slab_tax_total) = self.slab_tax(taxable_income);
        let rebate_applied = self.rebate(taxable_income, slab_tax_total);
        let tax_after_rebate = self.tax_after_rebate(slab_tax_total, rebate_applied);
        let cess = self.cess(tax_after_rebate);
        let total_tax_annual = tax_after_rebate + cess;

        let gross_monthly = monthly(pf.gross_annual);
        let tax_monthly = monthly(total_tax_annual);
        let net_monthly = gross_monthly - tax_monthly - pf.employee_monthly;

        trace!(
            assessment_year = %self.config.assessment_year,
            %annual_compensation,
            %taxable_income,
            %total_tax_annual,
            "computed income breakdown"
        );

        IncomeBreakdown {
            ctc: annual_compensation,
            employer_pf_monthly: pf.employer_monthly,
            employee_pf_monthly: pf.employee_monthly,
            gross_annual_after_employer_pf: pf.gross_annual,
            taxable_income,
            slab_lines,
            slab_tax_total,
            rebate_applied,
            tax_after_rebate,
            cess,
            total_tax_annual,
            gross_monthly,
            tax_monthly,
            net_monthly,
        }
    }

    /// Splits the CTC into employer PF, employee PF and the gross paid out.
    ///
    /// In percentage mode the employee share is taken on the gross *after*
    /// the employer share, not on the CTC.
    fn provident_fund(
        &self,
        annual_compensation: Decimal,
        pf_policy: &PfPolicy,
    ) -> PfSplit {
        match *pf_policy {
            PfPolicy::Percentage(percent) => {
                let employer_monthly = monthly(percent_of(annual_compensation, percent));
                let gross_annual = annual_compensation - annual(employer_monthly);
                let employee_monthly = monthly(percent_of(gross_annual, percent));
                PfSplit {
                    employer_monthly,
                    employee_monthly,
                    gross_annual,
                }
            }
            PfPolicy::Fixed(monthly_amount) => PfSplit {
                employer_monthly: monthly_amount,
                employee_monthly: monthly_amount,
                gross_annual: annual_compensation - annual(monthly_amount),
            },
        }
    }

    fn taxable_income(
        &self,
        gross_annual: Decimal,
    ) -> Decimal {
        max(gross_annual - self.config.standard_deduction, Decimal::ZERO)
    }

    /// Walks the slabs from zero, taxing each bracket's share of the income.
    fn slab_tax(
        &self,
        taxable_income: Decimal,
    ) -> (Vec<SlabLine>, Decimal) {
        let mut lines = Vec::new();
        let mut total = Decimal::ZERO;
        let mut remaining = taxable_income;
        let mut previous_limit = Decimal::ZERO;

        for slab in &self.config.slabs {
            if remaining <= Decimal::ZERO {
                break;
            }

            let taxable_amount = match slab.up_to {
                SlabLimit::Unbounded => remaining,
                SlabLimit::Bounded(up_to) => remaining.min(up_to - previous_limit),
            };
            let contribution = taxable_amount * slab.rate;

            lines.push(SlabLine {
                lower: previous_limit,
                upper: slab.up_to,
                taxable_amount,
                rate: slab.rate,
                contribution,
            });
            total += contribution;
            remaining -= taxable_amount;

            if let SlabLimit::Bounded(up_to) = slab.up_to {
                previous_limit = up_to;
            }
        }

        (lines, total)
    }

    /// Section 87A rebate.
    ///
    /// Any taxable income above the threshold forfeits the whole rebate.
    /// The rebate is rounded to the rupee and never exceeds the slab tax.
    fn rebate(
        &self,
        taxable_income: Decimal,
        slab_tax_total: Decimal,
    ) -> Decimal {
        let Some(rule) = &self.config.rebate else {
            return Decimal::ZERO;
        };
        if taxable_income > rule.income_threshold || slab_tax_total <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        round_to_rupee(slab_tax_total.min(rule.amount)).min(slab_tax_total)
    }

    fn tax_after_rebate(
        &self,
        slab_tax_total: Decimal,
        rebate_applied: Decimal,
    ) -> Decimal {
        max(slab_tax_total - rebate_applied, Decimal::ZERO)
    }

    /// Cess is levied on the tax left after the rebate.
    fn cess(
        &self,
        tax_after_rebate: Decimal,
    ) -> Decimal {
        tax_after_rebate * self.config.cess_rate
    }
}
