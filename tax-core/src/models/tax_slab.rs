use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound of a tax slab.
///
/// The final slab of every configuration is `Unbounded`; all others carry the
/// cumulative income ceiling of their bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlabLimit {
    Bounded(Decimal),
    Unbounded,
}

impl SlabLimit {
    /// The ceiling amount, or `None` for the unbounded slab.
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Bounded(amount) => Some(*amount),
            Self::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl From<Option<Decimal>> for SlabLimit {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Self::Unbounded, Self::Bounded)
    }
}

impl fmt::Display for SlabLimit {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Bounded(amount) => write!(f, "{amount}"),
            Self::Unbounded => f.write_str("∞"),
        }
    }
}

/// One bracket of a progressive tax schedule.
///
/// `rate` is a fraction (0.05 for 5%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub up_to: SlabLimit,
    pub rate: Decimal,
}

impl TaxSlab {
    pub fn bounded(
        up_to: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            up_to: SlabLimit::Bounded(up_to),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Self {
            up_to: SlabLimit::Unbounded,
            rate,
        }
    }
}
