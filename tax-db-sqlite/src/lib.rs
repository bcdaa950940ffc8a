//! SQLite backend for the tax slab and scenario repositories.

mod decimal;
mod factory;
mod repository;

pub use factory::{SqliteRepositoryFactory, connection_url, seeds_dir};
pub use repository::SqliteRepository;
