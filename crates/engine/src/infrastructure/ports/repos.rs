//! Repository port traits for database access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tablesmith_domain::{
    CreatureCriteria, CreatureId, CreaturePartition, CreatureRecord, CreatureSummary,
    EncounterTable, EncounterTableEntry, PublicSlug, RollNumber, TableId, UserId,
};

use super::access::Requester;
use super::error::RepoError;

// =============================================================================
// Creature Storage
// =============================================================================

/// Slice of the creature store a call may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureScope {
    /// The official catalog
    Official,
    /// Homebrew creatures created by one user, shared or not
    OwnedBy(UserId),
    /// Homebrew creatures any user has shared
    Public,
}

impl CreatureScope {
    /// Scope a partition resolves to for `requester`.
    ///
    /// Anonymous callers have no "own" partition.
    pub fn for_partition(partition: CreaturePartition, requester: &Requester) -> Option<Self> {
        match partition {
            CreaturePartition::Official => Some(Self::Official),
            CreaturePartition::Own => requester.user_id().map(Self::OwnedBy),
            CreaturePartition::Public => Some(Self::Public),
        }
    }

    pub fn partition(&self) -> CreaturePartition {
        match self {
            Self::Official => CreaturePartition::Official,
            Self::OwnedBy(_) => CreaturePartition::Own,
            Self::Public => CreaturePartition::Public,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreatureRepo: Send + Sync {
    /// Creatures in `scope` matching `criteria`.
    async fn query(
        &self,
        scope: CreatureScope,
        criteria: &CreatureCriteria,
    ) -> Result<Vec<CreatureSummary>, RepoError>;

    /// Full record, or `None` if absent or not visible in `scope`.
    async fn get_full(
        &self,
        scope: CreatureScope,
        id: CreatureId,
    ) -> Result<Option<CreatureRecord>, RepoError>;

    /// Insert or overwrite a creature (catalog import, seeding).
    async fn upsert(&self, record: &CreatureRecord) -> Result<(), RepoError>;
}

// =============================================================================
// Encounter Table Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EncounterTableRepo: Send + Sync {
    // Header CRUD
    async fn insert_table(&self, table: &EncounterTable) -> Result<(), RepoError>;
    async fn get_table(&self, id: TableId) -> Result<Option<EncounterTable>, RepoError>;
    async fn get_table_by_slug(
        &self,
        slug: &PublicSlug,
    ) -> Result<Option<EncounterTable>, RepoError>;
    async fn update_table(&self, table: &EncounterTable) -> Result<(), RepoError>;
    /// Delete a table and its entries; `false` if it did not exist.
    async fn delete_table(&self, id: TableId) -> Result<bool, RepoError>;

    // Entries
    /// Insert a batch of entries; all or nothing.
    async fn insert_entries(&self, entries: &[EncounterTableEntry]) -> Result<(), RepoError>;
    /// Entries ordered by roll number.
    async fn list_entries(&self, table_id: TableId)
        -> Result<Vec<EncounterTableEntry>, RepoError>;
    async fn get_entry(
        &self,
        table_id: TableId,
        roll: RollNumber,
    ) -> Result<Option<EncounterTableEntry>, RepoError>;
    /// Overwrite creature ref, snapshot and `updated_at` of one entry.
    async fn update_entry(&self, entry: &EncounterTableEntry) -> Result<(), RepoError>;
    /// Swap every entry of a table in one transaction.
    async fn replace_all_entries(
        &self,
        table_id: TableId,
        entries: &[EncounterTableEntry],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepoError>;

    // Queries
    async fn slug_exists(&self, slug: &PublicSlug) -> Result<bool, RepoError>;
    /// Newest first.
    async fn list_for_owner(
        &self,
        owner: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<EncounterTable>, RepoError>;
    async fn count_for_owner(&self, owner: UserId) -> Result<u64, RepoError>;
}
