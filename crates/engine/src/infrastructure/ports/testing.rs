//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// Uniform value in `min..=max`.
    fn gen_range(&self, min: i32, max: i32) -> i32;
    /// Uniform index in `0..upper`; `upper` is never zero.
    fn gen_index(&self, upper: usize) -> usize;
    fn gen_uuid(&self) -> Uuid;
}
