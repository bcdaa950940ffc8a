//! Shared arithmetic for the tax engine and the reporters.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to two decimal places, halves away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(12.345)), dec!(12.35));
/// assert_eq!(round_half_up(dec!(-12.345)), dec!(-12.35));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to the nearest whole rupee, halves away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_to_rupee;
///
/// assert_eq!(round_to_rupee(dec!(20000.49)), dec!(20000));
/// assert_eq!(round_to_rupee(dec!(20000.50)), dec!(20001));
/// ```
pub fn round_to_rupee(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// `amount * percent / 100`
pub fn percent_of(
    amount: Decimal,
    percent: Decimal,
) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// Spreads an annual amount over twelve months.
pub fn monthly(annual: Decimal) -> Decimal {
    annual / months_per_year()
}

/// Scales a monthly amount to a year.
pub fn annual(monthly: Decimal) -> Decimal {
    monthly * months_per_year()
}

fn months_per_year() -> Decimal {
    Decimal::from(12)
}
