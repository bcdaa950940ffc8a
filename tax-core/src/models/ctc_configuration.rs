use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PfPolicy;

/// Most salary variations a saved scenario keeps.
pub const MAX_EXPECTED_SALARIES: usize = 5;

/// A saved salary-comparison scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtcConfiguration {
    pub version: i64,
    pub saved_at: DateTime<Utc>,
    pub assessment_year: String,
    pub pf_policy: PfPolicy,
    /// Current CTC the expected salaries are compared against.
    pub previous_salary: Decimal,
    pub expected_salaries: Vec<Decimal>,
}

/// For saving new scenarios (no version or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCtcConfiguration {
    pub assessment_year: String,
    pub pf_policy: PfPolicy,
    pub previous_salary: Decimal,
    pub expected_salaries: Vec<Decimal>,
}

impl NewCtcConfiguration {
    /// Expected salaries capped at [`MAX_EXPECTED_SALARIES`]; stores persist
    /// only these.
    pub fn limited_salaries(&self) -> &[Decimal] {
        let len = self.expected_salaries.len().min(MAX_EXPECTED_SALARIES);
        &self.expected_salaries[..len]
    }

    pub fn into_saved(
        self,
        version: i64,
        saved_at: DateTime<Utc>,
    ) -> CtcConfiguration {
        let expected_salaries = self.limited_salaries().to_vec();
        CtcConfiguration {
            version,
            saved_at,
            assessment_year: self.assessment_year,
            pf_policy: self.pf_policy,
            previous_salary: self.previous_salary,
            expected_salaries,
        }
    }
}

/// Version listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioVersion {
    pub version: i64,
    pub saved_at: DateTime<Utc>,
}
