//! Clone table use case.
//!
//! Copies a shared table into the requester's collection. Snapshots are
//! copied verbatim; nothing is resampled.

use std::sync::Arc;

use tablesmith_domain::{EntryId, PublicSlug, TableId, TableWithEntries, UserId};

use crate::infrastructure::ports::{ClockPort, EncounterTableRepo, RandomPort};

use super::error::EncounterError;
use super::insert_with_compensation;

pub struct CloneTable {
    tables: Arc<dyn EncounterTableRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl CloneTable {
    pub fn new(
        tables: Arc<dyn EncounterTableRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            tables,
            clock,
            random,
        }
    }

    /// Copy the public table behind `slug` for `requester`.
    ///
    /// Malformed slugs and private tables both report `TableNotFound`.
    pub async fn execute(
        &self,
        slug: &str,
        requester: UserId,
    ) -> Result<TableWithEntries, EncounterError> {
        let not_found = || EncounterError::TableNotFound(slug.to_string());
        let slug = PublicSlug::new(slug).map_err(|_| not_found())?;

        let source = self
            .tables
            .get_table_by_slug(&slug)
            .await?
            .filter(|t| t.is_public())
            .ok_or_else(not_found)?;
        if source.is_owned_by(requester) {
            return Err(EncounterError::CannotCloneOwnTable);
        }
        let entries = self.tables.list_entries(source.id).await?;

        let now = self.clock.now();
        let table = source.copy_for(TableId::from_uuid(self.random.gen_uuid()), requester, now);
        let entries = entries
            .iter()
            .map(|e| e.copy_to(EntryId::from_uuid(self.random.gen_uuid()), table.id, now))
            .collect();
        let copy = TableWithEntries::new(table, entries);
        copy.check_invariants()?;

        insert_with_compensation(self.tables.as_ref(), &copy).await?;

        tracing::info!(
            source_table_id = %source.id,
            table_id = %copy.table.id,
            owner_id = %requester,
            "Encounter table copied"
        );
        Ok(copy)
    }
}
