//! Mapping between domain types and the wire DTOs in `tablesmith-shared`.

use chrono::{DateTime, SecondsFormat, Utc};
use tablesmith_domain::{
    CreaturePartition, EncounterFilter, EncounterTable, EncounterTableEntry, LevelRange,
    MovementType, SearchQuery, TableWithEntries,
};
use tablesmith_shared::{
    EncounterFilterData, EncounterTableData, EncounterTableEntryData,
    EncounterTableWithEntriesData, PaginatedData, PaginationData, RollResultData,
};

use super::http::ApiError;
use crate::use_cases::encounter::{Page, RollResult};

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn level(value: Option<i64>, default: u8, field: &str) -> Result<u8, ApiError> {
    match value {
        None => Ok(default),
        Some(raw) => u8::try_from(raw)
            .map_err(|_| ApiError::BadRequest(format!("{field} is out of range: {raw}"))),
    }
}

/// Parse the client's filter. Semantic checks (empty sources, inverted
/// range) are left to the use case.
pub fn filter_from_data(data: EncounterFilterData) -> Result<EncounterFilter, ApiError> {
    let sources = data
        .sources
        .iter()
        .map(|s| s.parse::<CreaturePartition>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let movement = data
        .movement_types
        .iter()
        .map(|m| m.parse::<MovementType>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let search = SearchQuery::parse_optional(data.search_query.as_deref())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let defaults = LevelRange::default();
    let mut filter = EncounterFilter::new(sources)
        .with_levels(
            level(data.level_min, defaults.min, "level_min")?,
            level(data.level_max, defaults.max, "level_max")?,
        )
        .with_movement(movement);
    if let Some(query) = search {
        filter = filter.with_search(query);
    }
    Ok(filter)
}

pub fn filter_to_data(filter: &EncounterFilter) -> EncounterFilterData {
    EncounterFilterData {
        sources: filter.sources.iter().map(|s| s.to_string()).collect(),
        level_min: Some(i64::from(filter.level_range.min)),
        level_max: Some(i64::from(filter.level_range.max)),
        movement_types: filter.movement_types.iter().map(|m| m.to_string()).collect(),
        search_query: filter.search_query.as_ref().map(|q| q.as_str().to_string()),
    }
}

pub fn table_data(table: &EncounterTable) -> EncounterTableData {
    EncounterTableData {
        id: table.id.to_uuid(),
        user_id: table.owner_id.to_uuid(),
        name: table.name.as_str().to_string(),
        description: table.description.as_ref().map(|d| d.as_str().to_string()),
        die_size: table.die_size.get(),
        is_public: table.is_public(),
        public_slug: table.public_slug().map(|s| s.as_str().to_string()),
        filters: filter_to_data(&table.filter),
        created_at: timestamp(table.created_at),
        updated_at: timestamp(table.updated_at),
    }
}

pub fn entry_data(entry: &EncounterTableEntry) -> Result<EncounterTableEntryData, ApiError> {
    let snapshot = serde_json::to_value(&entry.snapshot)
        .map_err(|e| ApiError::Internal(format!("snapshot serialization: {e}")))?;
    Ok(EncounterTableEntryData {
        id: entry.id.to_uuid(),
        table_id: entry.table_id.to_uuid(),
        roll_number: entry.roll_number.get(),
        creature_id: entry.creature_ref.id.to_uuid(),
        creature_source: entry.creature_ref.partition.to_string(),
        creature_snapshot: snapshot,
        created_at: timestamp(entry.created_at),
        updated_at: timestamp(entry.updated_at),
    })
}

pub fn table_with_entries_data(
    table: &TableWithEntries,
) -> Result<EncounterTableWithEntriesData, ApiError> {
    Ok(EncounterTableWithEntriesData {
        table: table_data(&table.table),
        entries: table
            .entries
            .iter()
            .map(entry_data)
            .collect::<Result<_, _>>()?,
    })
}

pub fn roll_data(result: &RollResult) -> Result<RollResultData, ApiError> {
    Ok(RollResultData {
        roll_number: result.roll_number.get(),
        entry: entry_data(&result.entry)?,
    })
}

pub fn page_data(page: &Page<EncounterTable>) -> PaginatedData<EncounterTableData> {
    PaginatedData {
        data: page.items.iter().map(table_data).collect(),
        pagination: PaginationData {
            page: page.page,
            limit: page.limit,
            total: page.total,
        },
    }
}
