//! Tablesmith Shared - wire types for the encounter table HTTP API
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and uuid
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` in DTOs

pub mod requests;
pub mod responses;

pub use requests::{
    CreateEncounterTableData, EncounterFilterData, ListTablesQuery, ReplaceEntryData,
    ReplaceModeData, ShareTableData, UpdateEncounterTableData,
};

pub use responses::{
    EncounterTableData, EncounterTableEntryData, EncounterTableWithEntriesData, ErrorBody,
    ErrorCode, PaginatedData, PaginationData, RollResultData, SuggestedNameData,
};
