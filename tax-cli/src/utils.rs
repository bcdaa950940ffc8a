use rust_decimal::Decimal;
use tax_core::{MAX_AMOUNT, MAX_PF_PERCENT};
use thiserror::Error;

const LAKH: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Error returned when a command-line amount cannot be read as rupees.
#[derive(Debug, Error, PartialEq)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("amount '{0}' is too large")]
    Overflow(String),

    #[error("'{input}' is outside ±{limit}")]
    OutOfRange { input: String, limit: Decimal },
}

/// Drops whitespace, the rupee sign and digit separators (`,` and `_`).
fn normalize_amount_input(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '_' | '₹'))
        .collect()
}

fn parse_scaled(s: &str) -> Result<Decimal, ParseAmountError> {
    let normalized = normalize_amount_input(s);
    let (digits, factor) = match normalized.strip_suffix(['L', 'l']) {
        Some(digits) => (digits, LAKH),
        None => (normalized.as_str(), Decimal::ONE),
    };
    if digits.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let value = digits.parse::<Decimal>().map_err(|source| {
        tracing::debug!(input = %s, "invalid amount: {source}");
        ParseAmountError::Invalid {
            input: s.to_string(),
            source,
        }
    })?;
    value
        .checked_mul(factor)
        .ok_or_else(|| ParseAmountError::Overflow(s.to_string()))
}

fn within(
    s: &str,
    value: Decimal,
    limit: Decimal,
) -> Result<Decimal, ParseAmountError> {
    if value.abs() > limit {
        return Err(ParseAmountError::OutOfRange {
            input: s.to_string(),
            limit,
        });
    }
    Ok(value)
}

/// Parses a rupee amount such as `17,00,000`, `₹1700000` or `17L`.
///
/// A trailing `L` (either case) multiplies by one lakh. Amounts past
/// [`MAX_AMOUNT`] are rejected.
pub fn parse_amount(s: &str) -> Result<Decimal, ParseAmountError> {
    within(s, parse_scaled(s)?, MAX_AMOUNT)
}

/// Parses a PF percentage (`12` for 12%), up to [`MAX_PF_PERCENT`].
pub fn parse_pf_percent(s: &str) -> Result<Decimal, ParseAmountError> {
    within(s, parse_scaled(s)?, MAX_PF_PERCENT)
}
