use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Regime, SlabLimit, TaxSlab};

/// Section 87A rebate rule.
///
/// A taxable income above `income_threshold` receives no rebate at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebateRule {
    /// Maximum rebate for the year.
    pub amount: Decimal,
    /// Highest taxable income that still qualifies.
    pub income_threshold: Decimal,
}

/// Errors reported when a slab configuration is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("configuration has no tax slabs")]
    NoSlabs,

    #[error("slab {index} ceiling {up_to} does not exceed the previous ceiling {previous}")]
    NotAscending {
        index: usize,
        up_to: Decimal,
        previous: Decimal,
    },

    #[error("final slab must be unbounded")]
    MissingUnboundedSlab,

    #[error("unbounded slab at position {0} is not the final slab")]
    UnboundedNotLast(usize),

    #[error("slab {index} rate {rate} is outside [0, 1]")]
    RateOutOfRange { index: usize, rate: Decimal },

    #[error("standard deduction {0} is negative")]
    NegativeStandardDeduction(Decimal),

    #[error("cess rate {0} is outside [0, 1]")]
    CessRateOutOfRange(Decimal),

    #[error("rebate {field} {value} is negative")]
    NegativeRebate { field: &'static str, value: Decimal },
}

/// Slabs, deduction, cess and rebate for one assessment year and regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlabConfiguration {
    pub assessment_year: String,
    pub regime: Regime,
    pub standard_deduction: Decimal,
    pub cess_rate: Decimal,
    pub slabs: Vec<TaxSlab>,
    pub rebate: Option<RebateRule>,
}

impl TaxSlabConfiguration {
    /// Checks the shape of the configuration.
    ///
    /// Slabs must be non-empty with strictly ascending positive ceilings, and
    /// exactly one unbounded slab in final position. Rates and the cess rate
    /// must lie in [0, 1]; the standard deduction and rebate fields must be
    /// non-negative.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let Some(last) = self.slabs.last() else {
            return Err(ConfigurationError::NoSlabs);
        };

        if self.standard_deduction < Decimal::ZERO {
            return Err(ConfigurationError::NegativeStandardDeduction(
                self.standard_deduction,
            ));
        }

        if !is_fraction(self.cess_rate) {
            return Err(ConfigurationError::CessRateOutOfRange(self.cess_rate));
        }

        if let Some(rebate) = &self.rebate {
            if rebate.amount < Decimal::ZERO {
                return Err(ConfigurationError::NegativeRebate {
                    field: "amount",
                    value: rebate.amount,
                });
            }
            if rebate.income_threshold < Decimal::ZERO {
                return Err(ConfigurationError::NegativeRebate {
                    field: "income threshold",
                    value: rebate.income_threshold,
                });
            }
        }

        let final_index = self.slabs.len() - 1;
        let mut previous = Decimal::ZERO;

        for (index, slab) in self.slabs.iter().enumerate() {
            if !is_fraction(slab.rate) {
                return Err(ConfigurationError::RateOutOfRange {
                    index,
                    rate: slab.rate,
                });
            }

            match slab.up_to {
                SlabLimit::Bounded(up_to) => {
                    if up_to <= previous {
                        return Err(ConfigurationError::NotAscending {
                            index,
                            up_to,
                            previous,
                        });
                    }
                    previous = up_to;
                }
                SlabLimit::Unbounded if index != final_index => {
                    return Err(ConfigurationError::UnboundedNotLast(index));
                }
                SlabLimit::Unbounded => {}
            }
        }

        if !last.up_to.is_unbounded() {
            return Err(ConfigurationError::MissingUnboundedSlab);
        }

        Ok(())
    }
}

fn is_fraction(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}
