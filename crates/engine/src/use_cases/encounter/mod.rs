//! Encounter table use cases.
//!
//! Generation, single-entry replacement, cloning of shared tables and the
//! surrounding table operations (read, list, update, share, roll, delete).

mod clone_table;
mod error;
mod generate_table;
mod manage;
mod replace_entry;
mod resolve_candidates;
mod sampler;
mod snapshot;
mod types;


use std::sync::Arc;

use tablesmith_domain::TableWithEntries;

use crate::infrastructure::ports::{EncounterTableRepo, RepoError};

pub use clone_table::CloneTable;
pub use error::{EncounterError, ErrorCategory};
pub use generate_table::GenerateTable;
pub use manage::TableOps;
pub use replace_entry::ReplaceEntry;
pub use resolve_candidates::ResolveCandidates;
pub use sampler::UniqueSampler;
pub use snapshot::SnapshotBuilder;
pub use types::{
    NewTable, Page, Pagination, ReplaceMode, RollResult, TableUpdate, DEFAULT_PAGE_LIMIT,
    MAX_PAGE_LIMIT,
};

/// Tunables for the encounter use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterSettings {
    /// Concurrent creature fetches per snapshot batch
    pub snapshot_concurrency: usize,
    /// Draws a random replacement may take when creatures vanish mid-flight
    pub replace_max_attempts: u32,
    /// Slug candidates tried before sharing gives up
    pub slug_max_attempts: u32,
}

impl Default for EncounterSettings {
    fn default() -> Self {
        Self {
            snapshot_concurrency: 16,
            replace_max_attempts: 3,
            slug_max_attempts: 5,
        }
    }
}

/// Container for encounter table use cases.
pub struct EncounterUseCases {
    pub generate: Arc<GenerateTable>,
    pub replace: Arc<ReplaceEntry>,
    pub clone: Arc<CloneTable>,
    pub ops: Arc<TableOps>,
}

impl EncounterUseCases {
    pub fn new(
        generate: Arc<GenerateTable>,
        replace: Arc<ReplaceEntry>,
        clone: Arc<CloneTable>,
        ops: Arc<TableOps>,
    ) -> Self {
        Self {
            generate,
            replace,
            clone,
            ops,
        }
    }
}

/// Persist a header and its entries as one unit.
///
/// If the entry batch fails the header is deleted again and the batch error
/// is returned, whether or not the delete succeeded.
pub(crate) async fn insert_with_compensation(
    tables: &dyn EncounterTableRepo,
    table: &TableWithEntries,
) -> Result<(), RepoError> {
    tables.insert_table(&table.table).await?;

    let Err(insert_err) = tables.insert_entries(&table.entries).await else {
        return Ok(());
    };

    match tables.delete_table(table.table.id).await {
        Ok(_) => tracing::warn!(
            table_id = %table.table.id,
            error = %insert_err,
            "Entry batch failed; table header removed"
        ),
        Err(delete_err) => tracing::error!(
            table_id = %table.table.id,
            error = %insert_err,
            compensation_error = %delete_err,
            "Entry batch failed and the table header could not be removed"
        ),
    }
    Err(insert_err)
}
