//! Encounter table operation errors.

use crate::infrastructure::ports::RepoError;
use tablesmith_domain::{CreatureId, DieSize, DomainError, InsufficientCandidates, TableId};

/// Errors that can occur during encounter table operations.
#[derive(Debug, thiserror::Error)]
pub enum EncounterError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Need {needed} distinct creatures but only {available} match the filter")]
    InsufficientCandidates { needed: usize, available: usize },
    #[error("Creature {creature_id} is unavailable: {reason}")]
    CreatureUnavailable {
        creature_id: CreatureId,
        reason: String,
    },
    #[error("Creature {creature_id} is already on this table")]
    DuplicateInTable { creature_id: CreatureId },
    #[error("Roll {roll_number} is not on a {die_size}")]
    RollOutOfRange { roll_number: u16, die_size: DieSize },
    #[error("Table {table_id} has no entry for roll {roll_number}")]
    EntryNotFound { table_id: TableId, roll_number: u16 },
    #[error("Encounter table not found: {0}")]
    TableNotFound(String),
    #[error("Not allowed to modify this table")]
    Forbidden,
    #[error("Cannot copy your own table")]
    CannotCloneOwnTable,
    #[error("No unique public slug after {attempts} attempts")]
    SlugGenerationFailed { attempts: u32 },
    #[error("Repository error: {0}")]
    Persistence(#[from] RepoError),
}

/// What the caller can do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fix the input; repeating the same request fails the same way
    UserCorrectable,
    /// Transient; the same request may succeed later
    Retryable,
    NotFound,
    Forbidden,
}

impl EncounterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidFilter(_)
            | Self::Validation(_)
            | Self::InsufficientCandidates { .. }
            | Self::DuplicateInTable { .. }
            | Self::RollOutOfRange { .. }
            | Self::CannotCloneOwnTable => ErrorCategory::UserCorrectable,
            Self::CreatureUnavailable { .. } | Self::SlugGenerationFailed { .. } => {
                ErrorCategory::Retryable
            }
            Self::EntryNotFound { .. } | Self::TableNotFound(_) => ErrorCategory::NotFound,
            Self::Forbidden => ErrorCategory::Forbidden,
            Self::Persistence(e) if e.is_not_found() => ErrorCategory::NotFound,
            Self::Persistence(_) => ErrorCategory::Retryable,
        }
    }

    pub(crate) fn unavailable(creature_id: CreatureId, reason: impl Into<String>) -> Self {
        Self::CreatureUnavailable {
            creature_id,
            reason: reason.into(),
        }
    }
}

impl From<InsufficientCandidates> for EncounterError {
    fn from(e: InsufficientCandidates) -> Self {
        Self::InsufficientCandidates {
            needed: e.needed,
            available: e.available,
        }
    }
}
