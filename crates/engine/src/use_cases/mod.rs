//! Use cases - User story orchestration.
//!
//! Use cases orchestrate the domain through port traits; they never touch
//! SQLite or HTTP types directly.

pub mod encounter;

pub use encounter::{EncounterError, EncounterSettings, EncounterUseCases};
