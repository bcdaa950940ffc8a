//! CSV import of tax slab configurations.

mod loader;

pub use loader::{SlabConfigurationLoader, SlabLoaderError, SlabRecord};
