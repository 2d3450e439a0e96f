//! Die size and roll number value objects
//!
//! An encounter table with die size N is indexed by the faces of an N-sided
//! die: roll numbers run from 1 to N inclusive.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Smallest die an encounter table can use
pub const MIN_DIE_SIZE: u16 = 2;

/// Largest die an encounter table can use
pub const MAX_DIE_SIZE: u16 = 1000;

/// Number of faces on the table's die (2..=1000)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct DieSize(u16);

impl DieSize {
    /// Create a validated die size.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the size is outside 2..=1000.
    pub fn new(size: u16) -> Result<Self, DomainError> {
        if size < MIN_DIE_SIZE {
            return Err(DomainError::validation(format!(
                "Die size must be at least {}",
                MIN_DIE_SIZE
            )));
        }
        if size > MAX_DIE_SIZE {
            return Err(DomainError::validation(format!(
                "Die size cannot exceed {}",
                MAX_DIE_SIZE
            )));
        }
        Ok(Self(size))
    }

    /// Validate a size that arrived as a wider integer (wire input).
    pub fn from_i64(size: i64) -> Result<Self, DomainError> {
        let size = u16::try_from(size).map_err(|_| {
            DomainError::validation(format!(
                "Die size must be between {} and {}",
                MIN_DIE_SIZE, MAX_DIE_SIZE
            ))
        })?;
        Self::new(size)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }

    /// Every roll number on this die, in ascending order.
    pub fn roll_numbers(self) -> impl Iterator<Item = RollNumber> {
        (1..=self.0).map(RollNumber)
    }

    /// Whether `roll` is a face of this die.
    pub fn contains(self, roll: RollNumber) -> bool {
        roll.0 <= self.0
    }

    /// Roll the die using an injected inclusive-range generator.
    ///
    /// The generator receives `(1, N)` and must return a value in that range.
    pub fn roll(self, gen_range: impl FnOnce(i32, i32) -> i32) -> Result<RollNumber, DomainError> {
        let value = gen_range(1, i32::from(self.0));
        let roll = u16::try_from(value)
            .ok()
            .filter(|v| (1..=self.0).contains(v))
            .ok_or_else(|| {
                DomainError::constraint(format!("Roll {} is outside 1..={}", value, self.0))
            })?;
        Ok(RollNumber(roll))
    }
}

impl fmt::Display for DieSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

impl TryFrom<u16> for DieSize {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DieSize> for u16 {
    fn from(value: DieSize) -> Self {
        value.0
    }
}

/// 1-based index of a table entry, i.e. a die result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct RollNumber(u16);

impl RollNumber {
    /// Create a roll number; zero is never a die face.
    pub fn new(value: u16) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::validation("Roll number must be at least 1"));
        }
        Ok(Self(value))
    }

    /// Position of the `index`-th entry (0-based) in a generated table.
    pub fn from_index(index: usize) -> Result<Self, DomainError> {
        u16::try_from(index + 1)
            .map_err(|_| DomainError::validation("Roll number out of range"))
            .and_then(Self::new)
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for RollNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for RollNumber {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RollNumber> for u16 {
    fn from(value: RollNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn die_size_bounds() {
        assert!(DieSize::new(1).is_err());
        assert!(DieSize::new(2).is_ok());
        assert!(DieSize::new(1000).is_ok());
        assert!(DieSize::new(1001).is_err());
        assert!(DieSize::from_i64(-6).is_err());
        assert!(DieSize::from_i64(70_000).is_err());
    }

    #[test]
    fn roll_numbers_cover_all_faces() {
        let d6 = DieSize::new(6).expect("valid");
        let rolls: Vec<u16> = d6.roll_numbers().map(RollNumber::get).collect();
        assert_eq!(rolls, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn contains_checks_upper_bound() {
        let d4 = DieSize::new(4).expect("valid");
        assert!(d4.contains(RollNumber::new(4).expect("valid")));
        assert!(!d4.contains(RollNumber::new(5).expect("valid")));
    }

    #[test]
    fn roll_passes_inclusive_range() {
        let d20 = DieSize::new(20).expect("valid");
        let roll = d20
            .roll(|min, max| {
                assert_eq!((min, max), (1, 20));
                17
            })
            .expect("in range");
        assert_eq!(roll.get(), 17);
    }

    #[test]
    fn roll_rejects_out_of_range_generator() {
        let d8 = DieSize::new(8).expect("valid");
        assert!(d8.roll(|_, _| 9).is_err());
        assert!(d8.roll(|_, _| 0).is_err());
    }

    #[test]
    fn zero_is_not_a_roll() {
        assert!(RollNumber::new(0).is_err());
        assert_eq!(RollNumber::from_index(0).expect("valid").get(), 1);
    }

    #[test]
    fn deserialize_validates() {
        let ok: DieSize = serde_json::from_str("12").expect("valid");
        assert_eq!(ok.get(), 12);
        assert!(serde_json::from_str::<DieSize>("1").is_err());
    }
}
