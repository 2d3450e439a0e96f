//! Generate table use case.
//!
//! Resolves the filter, draws `die_size` distinct creatures, snapshots them
//! and persists header plus entries as one unit.

use std::collections::HashSet;
use std::sync::Arc;

use tablesmith_domain::{
    CreatureSnapshot, DieSize, EncounterFilter, EncounterTable, EntryId, TableDescription,
    TableId, TableName, TableWithEntries, UserId,
};

use crate::infrastructure::ports::{
    AccessPolicy, ClockPort, EncounterTableRepo, RandomPort, Requester,
};

use super::error::EncounterError;
use super::insert_with_compensation;
use super::resolve_candidates::ResolveCandidates;
use super::sampler::UniqueSampler;
use super::snapshot::SnapshotBuilder;
use super::types::NewTable;

/// Generate table use case.
///
/// Orchestrates: input validation, candidate resolution, sampling without
/// replacement, concurrent snapshotting, compensated persistence.
pub struct GenerateTable {
    resolver: Arc<ResolveCandidates>,
    sampler: Arc<UniqueSampler>,
    snapshots: Arc<SnapshotBuilder>,
    tables: Arc<dyn EncounterTableRepo>,
    access: Arc<dyn AccessPolicy>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl GenerateTable {
    pub fn new(
        resolver: Arc<ResolveCandidates>,
        sampler: Arc<UniqueSampler>,
        snapshots: Arc<SnapshotBuilder>,
        tables: Arc<dyn EncounterTableRepo>,
        access: Arc<dyn AccessPolicy>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            resolver,
            sampler,
            snapshots,
            tables,
            access,
            clock,
            random,
        }
    }

    /// Generate and persist a new table owned by `owner`.
    ///
    /// # Returns
    /// * `Ok(TableWithEntries)` - Exactly `die_size` entries, rolls `1..=die_size`
    /// * `Err(EncounterError)` - Nothing is left persisted
    pub async fn execute(
        &self,
        owner: UserId,
        input: NewTable,
    ) -> Result<TableWithEntries, EncounterError> {
        let generated = self.draft(owner, input).await?;
        insert_with_compensation(self.tables.as_ref(), &generated).await?;

        tracing::info!(
            table_id = %generated.table.id,
            owner_id = %owner,
            die_size = generated.table.die_size.get(),
            "Encounter table generated"
        );
        Ok(generated)
    }

    /// Same pipeline as [`Self::execute`] without persisting anything.
    pub async fn preview(
        &self,
        owner: UserId,
        input: NewTable,
    ) -> Result<TableWithEntries, EncounterError> {
        self.draft(owner, input).await
    }

    /// Redraw every entry of an existing table from its stored filter.
    ///
    /// The header keeps its id, name and visibility; only `updated_at` moves.
    pub async fn regenerate(
        &self,
        table_id: TableId,
        requester: &Requester,
    ) -> Result<TableWithEntries, EncounterError> {
        let mut table = self
            .tables
            .get_table(table_id)
            .await?
            .ok_or_else(|| EncounterError::TableNotFound(table_id.to_string()))?;
        if !self.access.can_modify(table.owner_id, requester) {
            return Err(EncounterError::Forbidden);
        }

        let snapshots = self
            .draw(&table.filter, table.die_size, requester)
            .await?;
        let now = self.clock.now();
        table.touch(now);
        let regenerated = TableWithEntries::assemble(table, snapshots, || self.entry_id(), now)?;

        self.tables
            .replace_all_entries(table_id, &regenerated.entries, now)
            .await?;

        tracing::info!(
            table_id = %table_id,
            die_size = regenerated.table.die_size.get(),
            "Encounter table regenerated"
        );
        Ok(regenerated)
    }

    async fn draft(
        &self,
        owner: UserId,
        input: NewTable,
    ) -> Result<TableWithEntries, EncounterError> {
        let die_size = DieSize::from_i64(input.die_size)?;
        let name = TableName::new(input.name)?;
        let description = TableDescription::parse_optional(input.description.as_deref())?;

        let requester = Requester::User(owner);
        let snapshots = self.draw(&input.filter, die_size, &requester).await?;

        let now = self.clock.now();
        let table = EncounterTable::new(
            TableId::from_uuid(self.random.gen_uuid()),
            owner,
            name,
            description,
            die_size,
            input.filter,
            now,
        );
        Ok(TableWithEntries::assemble(
            table,
            snapshots,
            || self.entry_id(),
            now,
        )?)
    }

    async fn draw(
        &self,
        filter: &EncounterFilter,
        die_size: DieSize,
        requester: &Requester,
    ) -> Result<Vec<CreatureSnapshot>, EncounterError> {
        let pool = self.resolver.execute(filter, requester).await?;
        let picked = self
            .sampler
            .sample(&pool, die_size.as_usize(), &HashSet::new())?;
        tracing::debug!(
            pool_size = pool.len(),
            die_size = die_size.get(),
            "Creatures drawn for table"
        );
        self.snapshots.build_many(picked, requester).await
    }

    fn entry_id(&self) -> EntryId {
        EntryId::from_uuid(self.random.gen_uuid())
    }
}
