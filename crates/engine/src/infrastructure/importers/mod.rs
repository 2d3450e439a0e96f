//! Content importers.
//!
//! Loads the official creature catalog from a JSON file at startup.

mod catalog;

pub use catalog::{CatalogImporter, ImportError, ImportSummary};
