//! Encounter table aggregate
//!
//! A table with die size N owns exactly N entries, one per roll number
//! `1..=N`, and no creature appears on it twice. Each entry embeds a frozen
//! `CreatureSnapshot`; the `CreatureRef` beside it is only a weak pointer back
//! to the source creature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::entities::{CreatureRef, CreatureSnapshot};
use crate::error::DomainError;
use crate::ids::{CreatureId, EntryId, TableId, UserId};
use crate::value_objects::{
    DieSize, EncounterFilter, PublicSlug, RollNumber, TableDescription, TableName,
};

/// Whether a table can be read and copied by other users
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableVisibility {
    #[default]
    Private,
    Public(PublicSlug),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTable {
    pub id: TableId,
    pub owner_id: UserId,
    pub name: TableName,
    pub description: Option<TableDescription>,
    pub die_size: DieSize,
    /// Filter the entries were drawn with; kept for replacement and regeneration
    pub filter: EncounterFilter,
    pub visibility: TableVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EncounterTable {
    pub fn new(
        id: TableId,
        owner_id: UserId,
        name: TableName,
        description: Option<TableDescription>,
        die_size: DieSize,
        filter: EncounterFilter,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name,
            description,
            die_size,
            filter,
            visibility: TableVisibility::Private,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self.visibility, TableVisibility::Public(_))
    }

    pub fn public_slug(&self) -> Option<&PublicSlug> {
        match &self.visibility {
            TableVisibility::Public(slug) => Some(slug),
            TableVisibility::Private => None,
        }
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    pub fn make_public(&mut self, slug: PublicSlug, now: DateTime<Utc>) {
        self.visibility = TableVisibility::Public(slug);
        self.updated_at = now;
    }

    pub fn make_private(&mut self, now: DateTime<Utc>) {
        self.visibility = TableVisibility::Private;
        self.updated_at = now;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Header for a private copy of this table owned by `owner_id`.
    pub fn copy_for(&self, id: TableId, owner_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            name: self.name.copy_of(),
            description: self.description.clone(),
            die_size: self.die_size,
            filter: self.filter.clone(),
            visibility: TableVisibility::Private,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One row of an encounter table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTableEntry {
    pub id: EntryId,
    pub table_id: TableId,
    pub roll_number: RollNumber,
    pub creature_ref: CreatureRef,
    pub snapshot: CreatureSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EncounterTableEntry {
    pub fn new(
        id: EntryId,
        table_id: TableId,
        roll_number: RollNumber,
        snapshot: CreatureSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            table_id,
            roll_number,
            creature_ref: snapshot.creature_ref(),
            snapshot,
            created_at: now,
            updated_at: now,
        }
    }

    /// Point this slot at a different creature; id and roll number stay.
    pub fn replace_with(&mut self, snapshot: CreatureSnapshot, now: DateTime<Utc>) {
        self.creature_ref = snapshot.creature_ref();
        self.snapshot = snapshot;
        self.updated_at = now;
    }

    /// Copy of this entry for another table, snapshot kept verbatim.
    pub fn copy_to(&self, id: EntryId, table_id: TableId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            table_id,
            roll_number: self.roll_number,
            creature_ref: self.creature_ref,
            snapshot: self.snapshot.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A table header together with all of its entries, ordered by roll number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableWithEntries {
    pub table: EncounterTable,
    pub entries: Vec<EncounterTableEntry>,
}

impl TableWithEntries {
    pub fn new(table: EncounterTable, mut entries: Vec<EncounterTableEntry>) -> Self {
        entries.sort_by_key(|e| e.roll_number);
        Self { table, entries }
    }

    /// Lay snapshots out as roll numbers `1..=N` in the given order.
    pub fn assemble(
        table: EncounterTable,
        snapshots: Vec<CreatureSnapshot>,
        mut next_entry_id: impl FnMut() -> EntryId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let entries = snapshots
            .into_iter()
            .enumerate()
            .map(|(index, snapshot)| {
                let roll = RollNumber::from_index(index)?;
                Ok(EncounterTableEntry::new(
                    next_entry_id(),
                    table.id,
                    roll,
                    snapshot,
                    now,
                ))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        let assembled = Self { table, entries };
        assembled.check_invariants()?;
        Ok(assembled)
    }

    /// Exactly one entry per roll number and no creature twice.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Constraint` describing the first violation.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        let die_size = self.table.die_size;
        if self.entries.len() != die_size.as_usize() {
            return Err(DomainError::constraint(format!(
                "Table {} has {} entries, expected {}",
                self.table.id,
                self.entries.len(),
                die_size.get()
            )));
        }

        let mut rolls = HashSet::with_capacity(self.entries.len());
        let mut creatures = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.table_id != self.table.id {
                return Err(DomainError::constraint(format!(
                    "Entry {} belongs to table {}",
                    entry.id, entry.table_id
                )));
            }
            if !die_size.contains(entry.roll_number) || !rolls.insert(entry.roll_number) {
                return Err(DomainError::constraint(format!(
                    "Roll number {} is duplicated or outside {}",
                    entry.roll_number, die_size
                )));
            }
            if !creatures.insert(entry.creature_ref.id) {
                return Err(DomainError::constraint(format!(
                    "Creature {} appears more than once",
                    entry.creature_ref.id
                )));
            }
        }
        Ok(())
    }

    pub fn entry(&self, roll: RollNumber) -> Option<&EncounterTableEntry> {
        self.entries.iter().find(|e| e.roll_number == roll)
    }

    /// Creatures on every entry except `roll`.
    pub fn other_creature_ids(&self, roll: RollNumber) -> HashSet<CreatureId> {
        self.entries
            .iter()
            .filter(|e| e.roll_number != roll)
            .map(|e| e.creature_ref.id)
            .collect()
    }
}
