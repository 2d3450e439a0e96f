//! Domain entities - Core business objects with identity

mod creature;
mod encounter_table;

pub use creature::{
    Ability, AbilityModifiers, AbilityScores, Alignment, Attack, CreatureCandidate,
    CreatureRecord, CreatureRef, CreatureSnapshot, CreatureSummary, Treasure,
};
pub use encounter_table::{EncounterTable, EncounterTableEntry, TableVisibility, TableWithEntries};
