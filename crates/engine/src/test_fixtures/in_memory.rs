//! In-memory repository adapters for scenario tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tablesmith_domain::{
    CreatureCriteria, CreatureId, CreaturePartition, CreatureRecord, CreatureSummary,
    EncounterTable, EncounterTableEntry, PublicSlug, RollNumber, TableId, UserId,
};

use crate::infrastructure::ports::{CreatureRepo, CreatureScope, EncounterTableRepo, RepoError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Creatures
// =============================================================================

#[derive(Default)]
pub struct InMemoryCreatureRepo {
    records: Mutex<Vec<CreatureRecord>>,
}

impl InMemoryCreatureRepo {
    pub fn with_records(records: Vec<CreatureRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Drop a creature, as if its author deleted it.
    pub fn remove(&self, id: CreatureId) {
        lock(&self.records).retain(|r| r.id != id);
    }

    /// Rename a creature in place.
    pub fn rename(&self, id: CreatureId, name: &str) {
        for record in lock(&self.records).iter_mut().filter(|r| r.id == id) {
            record.name = name.to_string();
        }
    }

    fn visible(scope: CreatureScope, record: &CreatureRecord) -> bool {
        let homebrew = record.partition != CreaturePartition::Official;
        match scope {
            CreatureScope::Official => !homebrew,
            CreatureScope::OwnedBy(owner) => homebrew && record.owner_id == Some(owner),
            CreatureScope::Public => homebrew && record.is_public,
        }
    }
}

#[async_trait]
impl CreatureRepo for InMemoryCreatureRepo {
    async fn query(
        &self,
        scope: CreatureScope,
        criteria: &CreatureCriteria,
    ) -> Result<Vec<CreatureSummary>, RepoError> {
        Ok(lock(&self.records)
            .iter()
            .filter(|r| Self::visible(scope, r))
            .map(|r| CreatureSummary {
                partition: scope.partition(),
                ..r.summary()
            })
            .filter(|s| criteria.matches(s))
            .collect())
    }

    async fn get_full(
        &self,
        scope: CreatureScope,
        id: CreatureId,
    ) -> Result<Option<CreatureRecord>, RepoError> {
        Ok(lock(&self.records)
            .iter()
            .find(|r| r.id == id && Self::visible(scope, r))
            .map(|r| CreatureRecord {
                partition: scope.partition(),
                ..r.clone()
            }))
    }

    async fn upsert(&self, record: &CreatureRecord) -> Result<(), RepoError> {
        let mut records = lock(&self.records);
        records.retain(|r| r.id != record.id);
        records.push(record.clone());
        Ok(())
    }
}

// =============================================================================
// Encounter Tables
// =============================================================================

#[derive(Default)]
struct TableState {
    tables: BTreeMap<TableId, EncounterTable>,
    entries: Vec<EncounterTableEntry>,
}

impl TableState {
    /// Same uniqueness rules as the SQLite indexes, checked against
    /// `entries` plus `incoming`.
    fn check_unique(
        existing: &[EncounterTableEntry],
        incoming: &[EncounterTableEntry],
    ) -> Result<(), RepoError> {
        let mut all: Vec<&EncounterTableEntry> = existing.iter().collect();
        for entry in incoming {
            let clash = all.iter().any(|e| {
                e.table_id == entry.table_id
                    && (e.roll_number == entry.roll_number
                        || e.creature_ref.id == entry.creature_ref.id)
            });
            if clash {
                return Err(RepoError::constraint(format!(
                    "entry {} collides on table {}",
                    entry.id, entry.table_id
                )));
            }
            all.push(entry);
        }
        Ok(())
    }
}

/// Table store that can be told to fail entry batches.
#[derive(Default)]
pub struct InMemoryEncounterTableRepo {
    state: Mutex<TableState>,
    fail_entry_inserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryEncounterTableRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_entry_inserts(&self, fail: bool) {
        self.fail_entry_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn table_count(&self) -> usize {
        lock(&self.state).tables.len()
    }

    pub fn entry_count(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn entries_of(&self, table_id: TableId) -> Vec<EncounterTableEntry> {
        let mut entries: Vec<_> = lock(&self.state)
            .entries
            .iter()
            .filter(|e| e.table_id == table_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.roll_number);
        entries
    }
}

#[async_trait]
impl EncounterTableRepo for InMemoryEncounterTableRepo {
    async fn insert_table(&self, table: &EncounterTable) -> Result<(), RepoError> {
        let mut state = lock(&self.state);
        if state.tables.contains_key(&table.id) {
            return Err(RepoError::constraint(format!("table {} exists", table.id)));
        }
        if let Some(slug) = table.public_slug() {
            if state.tables.values().any(|t| t.public_slug() == Some(slug)) {
                return Err(RepoError::constraint(format!("slug {} taken", slug)));
            }
        }
        state.tables.insert(table.id, table.clone());
        Ok(())
    }

    async fn get_table(&self, id: TableId) -> Result<Option<EncounterTable>, RepoError> {
        Ok(lock(&self.state).tables.get(&id).cloned())
    }

    async fn get_table_by_slug(
        &self,
        slug: &PublicSlug,
    ) -> Result<Option<EncounterTable>, RepoError> {
        Ok(lock(&self.state)
            .tables
            .values()
            .find(|t| t.public_slug() == Some(slug))
            .cloned())
    }

    async fn update_table(&self, table: &EncounterTable) -> Result<(), RepoError> {
        let mut state = lock(&self.state);
        if let Some(slug) = table.public_slug() {
            let taken = state
                .tables
                .values()
                .any(|t| t.id != table.id && t.public_slug() == Some(slug));
            if taken {
                return Err(RepoError::constraint(format!("slug {} taken", slug)));
            }
        }
        match state.tables.get_mut(&table.id) {
            Some(stored) => {
                *stored = table.clone();
                Ok(())
            }
            None => Err(RepoError::not_found("EncounterTable", table.id)),
        }
    }

    async fn delete_table(&self, id: TableId) -> Result<bool, RepoError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RepoError::database("delete_table", "injected failure"));
        }
        let mut state = lock(&self.state);
        state.entries.retain(|e| e.table_id != id);
        Ok(state.tables.remove(&id).is_some())
    }

    async fn insert_entries(&self, entries: &[EncounterTableEntry]) -> Result<(), RepoError> {
        if self.fail_entry_inserts.load(Ordering::SeqCst) {
            return Err(RepoError::database("insert_entries", "injected failure"));
        }
        let mut state = lock(&self.state);
        if let Some(orphan) = entries
            .iter()
            .find(|e| !state.tables.contains_key(&e.table_id))
        {
            return Err(RepoError::constraint(format!(
                "table {} does not exist",
                orphan.table_id
            )));
        }
        TableState::check_unique(&state.entries, entries)?;
        state.entries.extend_from_slice(entries);
        Ok(())
    }

    async fn list_entries(
        &self,
        table_id: TableId,
    ) -> Result<Vec<EncounterTableEntry>, RepoError> {
        Ok(self.entries_of(table_id))
    }

    async fn get_entry(
        &self,
        table_id: TableId,
        roll: RollNumber,
    ) -> Result<Option<EncounterTableEntry>, RepoError> {
        Ok(lock(&self.state)
            .entries
            .iter()
            .find(|e| e.table_id == table_id && e.roll_number == roll)
            .cloned())
    }

    async fn update_entry(&self, entry: &EncounterTableEntry) -> Result<(), RepoError> {
        let mut state = lock(&self.state);
        let others: Vec<EncounterTableEntry> = state
            .entries
            .iter()
            .filter(|e| e.id != entry.id)
            .cloned()
            .collect();
        TableState::check_unique(&others, std::slice::from_ref(entry))?;
        match state.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(RepoError::not_found("EncounterTableEntry", entry.id)),
        }
    }

    async fn replace_all_entries(
        &self,
        table_id: TableId,
        entries: &[EncounterTableEntry],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let mut state = lock(&self.state);
        if !state.tables.contains_key(&table_id) {
            return Err(RepoError::not_found("EncounterTable", table_id));
        }
        let others: Vec<EncounterTableEntry> = state
            .entries
            .iter()
            .filter(|e| e.table_id != table_id)
            .cloned()
            .collect();
        TableState::check_unique(&others, entries)?;
        state.entries = others;
        state.entries.extend_from_slice(entries);
        if let Some(table) = state.tables.get_mut(&table_id) {
            table.touch(updated_at);
        }
        Ok(())
    }

    async fn slug_exists(&self, slug: &PublicSlug) -> Result<bool, RepoError> {
        Ok(lock(&self.state)
            .tables
            .values()
            .any(|t| t.public_slug() == Some(slug)))
    }

    async fn list_for_owner(
        &self,
        owner: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<EncounterTable>, RepoError> {
        let mut owned: Vec<EncounterTable> = lock(&self.state)
            .tables
            .values()
            .filter(|t| t.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_for_owner(&self, owner: UserId) -> Result<u64, RepoError> {
        Ok(lock(&self.state)
            .tables
            .values()
            .filter(|t| t.is_owned_by(owner))
            .count() as u64)
    }
}
