pub mod builtin;
pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::{
    MAX_AMOUNT, MAX_PF_PERCENT, TaxEngine, compute_breakdown, within_limits,
};
pub use db::repository::{Repository, RepositoryError, ScenarioStore, TaxRepository};
pub use models::*;
