use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How provident-fund contributions are derived for a salary.
///
/// Serialized as `{ "mode": "percentage" | "fixed", "value": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum PfPolicy {
    /// Employer and employee each contribute this percentage (12 for 12%).
    /// The employee share is taken on the CTC net of the employer share.
    Percentage(Decimal),
    /// Employee contributes this many rupees per month; the employer is
    /// assumed to match it.
    Fixed(Decimal),
}

impl PfPolicy {
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Percentage(_) => "percentage",
            Self::Fixed(_) => "fixed",
        }
    }

    pub fn value(&self) -> Decimal {
        match self {
            Self::Percentage(value) | Self::Fixed(value) => *value,
        }
    }

    pub fn from_parts(
        mode: &str,
        value: Decimal,
    ) -> Option<Self> {
        match mode {
            "percentage" => Some(Self::Percentage(value)),
            "fixed" => Some(Self::Fixed(value)),
            _ => None,
        }
    }
}

impl Default for PfPolicy {
    fn default() -> Self {
        Self::Percentage(Decimal::from(12))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_is_twelve_percent() {
        assert_eq!(PfPolicy::default(), PfPolicy::Percentage(dec!(12)));
    }

    #[test]
    fn from_parts_round_trips_mode_and_value() {
        let policy = PfPolicy::Fixed(dec!(1800));

        assert_eq!(
            PfPolicy::from_parts(policy.mode(), policy.value()),
            Some(policy)
        );
        assert_eq!(PfPolicy::from_parts("matching", dec!(1)), None);
    }

    #[test]
    fn serializes_as_mode_and_value() {
        let json = serde_json::to_value(PfPolicy::Percentage(dec!(12))).unwrap();

        assert_eq!(json["mode"], "percentage");
        assert_eq!(json["value"], "12");
    }
}
