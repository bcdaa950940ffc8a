//! Display formatting for rupee amounts and percentages.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::calculations::common::round_to_rupee;

const RUPEE: char = '₹';

/// Nearest whole rupee, grouped the Indian way (`₹12,34,567`).
///
/// Negative amounts carry a leading minus: `-₹1,234`.
pub fn format_rupees(amount: Decimal) -> String {
    let rounded = round_to_rupee(amount);
    let digits = rounded.abs().normalize().to_string();
    let grouped = group_indian(&digits);

    if rounded < Decimal::ZERO {
        format!("-{RUPEE}{grouped}")
    } else {
        format!("{RUPEE}{grouped}")
    }
}

/// Percentage with a fixed number of decimals, halves away from zero.
pub fn format_percent(
    value: Decimal,
    decimals: u32,
) -> String {
    format!("{}%", fixed(value, decimals))
}

/// Amount in lakhs to one decimal: `₹17.0L`.
pub fn format_lakhs(amount: Decimal) -> String {
    let lakhs = amount / Decimal::from(100_000);
    format!("{RUPEE}{}L", fixed(lakhs, 1))
}

fn fixed(
    value: Decimal,
    decimals: u32,
) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(decimals);
    rounded
}

/// Last three digits, then pairs: "1234567" → "12,34,567".
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}
