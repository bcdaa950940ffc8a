use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SlabLimit;

/// Tax charged in one bracket of the slab walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabLine {
    /// Lower bound of the bracket (the previous slab's ceiling).
    pub lower: Decimal,
    pub upper: SlabLimit,
    /// Part of the taxable income that falls inside this bracket.
    pub taxable_amount: Decimal,
    pub rate: Decimal,
    pub contribution: Decimal,
}

/// Degenerate inputs a consumer may want to surface. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakdownWarning {
    NegativeCompensation,
    ProvidentFundExceedsCompensation,
    NegativeNetPay,
}

impl fmt::Display for BreakdownWarning {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let message = match self {
            Self::NegativeCompensation => "annual compensation is negative",
            Self::ProvidentFundExceedsCompensation => {
                "employer provident fund exceeds the annual compensation"
            }
            Self::NegativeNetPay => "deductions exceed the monthly gross pay",
        };
        f.write_str(message)
    }
}

/// Full result of a take-home computation for one CTC.
///
/// Monthly figures are unrounded; consumers round for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub ctc: Decimal,
    pub employer_pf_monthly: Decimal,
    pub employee_pf_monthly: Decimal,
    pub gross_annual_after_employer_pf: Decimal,
    pub taxable_income: Decimal,
    pub slab_lines: Vec<SlabLine>,
    pub slab_tax_total: Decimal,
    pub rebate_applied: Decimal,
    pub tax_after_rebate: Decimal,
    pub cess: Decimal,
    pub total_tax_annual: Decimal,
    pub gross_monthly: Decimal,
    pub tax_monthly: Decimal,
    pub net_monthly: Decimal,
}

impl IncomeBreakdown {
    /// Annual tax as a percentage of the gross after employer PF; zero when
    /// that gross is not positive.
    pub fn effective_tax_rate(&self) -> Decimal {
        if self.gross_annual_after_employer_pf > Decimal::ZERO {
            self.total_tax_annual / self.gross_annual_after_employer_pf * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }

    pub fn warnings(&self) -> Vec<BreakdownWarning> {
        let mut warnings = Vec::new();
        if self.ctc < Decimal::ZERO {
            warnings.push(BreakdownWarning::NegativeCompensation);
        }
        if self.gross_annual_after_employer_pf < Decimal::ZERO {
            warnings.push(BreakdownWarning::ProvidentFundExceedsCompensation);
        }
        if self.net_monthly < Decimal::ZERO {
            warnings.push(BreakdownWarning::NegativeNetPay);
        }
        warnings
    }
}
