mod assessment_year;
mod ctc_configuration;
mod income_breakdown;
mod pf_policy;
mod regime;
mod tax_slab;
mod tax_slab_configuration;

pub use assessment_year::AssessmentYear;
pub use ctc_configuration::{
    CtcConfiguration, MAX_EXPECTED_SALARIES, NewCtcConfiguration, ScenarioVersion,
};
pub use income_breakdown::{BreakdownWarning, IncomeBreakdown, SlabLine};
pub use pf_policy::PfPolicy;
pub use regime::Regime;
pub use tax_slab::{SlabLimit, TaxSlab};
pub use tax_slab_configuration::{ConfigurationError, RebateRule, TaxSlabConfiguration};
