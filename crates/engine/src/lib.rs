//! Tablesmith Engine library.
//!
//! This crate contains all server-side code for encounter tables.
//!
//! ## Structure
//!
//! - `use_cases/` - Generation, replacement, cloning and table operations
//! - `infrastructure/` - Port traits plus SQLite, clock and importer adapters
//! - `api/` - HTTP entry points
//! - `config` - Environment configuration
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod config;
pub mod infrastructure;
pub mod use_cases;

/// In-memory fakes and creature fixtures shared by unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
