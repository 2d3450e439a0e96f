//! Tablesmith domain: encounter tables, creature snapshots and the rules
//! that keep them consistent. No I/O and no RNG; randomness is injected.

pub mod entities;
pub mod error;
pub mod ids;
pub mod name_generator;
pub mod sampling;
pub mod value_objects;

pub use entities::{
    Ability, AbilityModifiers, AbilityScores, Alignment, Attack, CreatureCandidate,
    CreatureRecord, CreatureRef, CreatureSnapshot, CreatureSummary, EncounterTable,
    EncounterTableEntry, TableVisibility, TableWithEntries, Treasure,
};

pub use error::DomainError;

pub use ids::{CreatureId, EntryId, TableId, UserId};

pub use name_generator::generate_table_name;
pub use sampling::{sample_without_replacement, InsufficientCandidates};

pub use value_objects::{
    CreatureCriteria, CreaturePartition, DieSize, EncounterFilter, LevelRange, MovementType,
    PublicSlug, RollNumber, SearchQuery, TableDescription, TableName,
};
