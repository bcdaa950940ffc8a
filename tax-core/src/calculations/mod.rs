pub mod common;
pub mod comparison;
pub mod engine;
pub mod format;
pub mod summary;

pub use comparison::{ComparisonResult, compare, hike_percent};
pub use engine::{MAX_AMOUNT, MAX_PF_PERCENT, TaxEngine, compute_breakdown, within_limits};
pub use format::{format_lakhs, format_percent, format_rupees};
pub use summary::{
    StructuredSummary, SummaryRow, meta_description, salary_summary, structured_summary,
    summarize,
};
