//! Value objects - Immutable objects defined by their attributes

mod dice;
mod encounter_filter;
mod names;
mod public_slug;

pub use dice::{DieSize, RollNumber, MAX_DIE_SIZE, MIN_DIE_SIZE};

// Filter model and the shared match predicate
pub use encounter_filter::{
    CreatureCriteria, CreaturePartition, EncounterFilter, LevelRange, MovementType, SearchQuery,
    MAX_CHALLENGE_LEVEL, MAX_SEARCH_QUERY_LENGTH, MIN_CHALLENGE_LEVEL,
};

pub use names::{
    TableDescription, TableName, MAX_TABLE_DESCRIPTION_LENGTH, MAX_TABLE_NAME_LENGTH,
    MIN_TABLE_NAME_LENGTH,
};
pub use public_slug::{PublicSlug, PUBLIC_SLUG_LENGTH};
