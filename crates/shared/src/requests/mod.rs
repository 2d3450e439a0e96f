//! Request bodies and query strings accepted by the HTTP API

mod encounter_table;

pub use encounter_table::{
    CreateEncounterTableData, EncounterFilterData, ListTablesQuery, ReplaceEntryData,
    ReplaceModeData, ShareTableData, UpdateEncounterTableData,
};
