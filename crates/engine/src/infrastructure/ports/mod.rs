//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Database access (could swap SQLite -> Postgres)
//! - Identity/ownership (could swap owner-only -> shared editing)
//! - Clock/Random (for testing)

mod access;
mod error;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CreatureRepo, CreatureScope, EncounterTableRepo};

// =============================================================================
// Identity Ports
// =============================================================================
pub use access::{AccessPolicy, OwnerOnly, Requester};

// =============================================================================
// Error Types
// =============================================================================
pub use error::RepoError;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use access::MockAccessPolicy;
#[cfg(test)]
pub use repos::{MockCreatureRepo, MockEncounterTableRepo};
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
