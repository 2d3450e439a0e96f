use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Filter as the client sends it; validated by the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterFilterData {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_max: Option<i64>,
    #[serde(default)]
    pub movement_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

/// Body of `POST /api/encounter-tables` and `POST /api/encounter-tables/preview`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEncounterTableData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub die_size: i64,
    #[serde(alias = "filter")]
    pub filters: EncounterFilterData,
}

/// Body of `PATCH /api/encounter-tables/{id}`
///
/// Absent fields are left alone; a blank description clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEncounterTableData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "filter", skip_serializing_if = "Option::is_none")]
    pub filters: Option<EncounterFilterData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceModeData {
    Random,
    Search,
}

/// Body of `PATCH /api/encounter-tables/{id}/entries/{roll}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceEntryData {
    pub mode: ReplaceModeData,
    /// Required when `mode` is `search`
    #[serde(default, alias = "monster_id", skip_serializing_if = "Option::is_none")]
    pub creature_id: Option<Uuid>,
}

/// Body of `PATCH /api/encounter-tables/{id}/share`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTableData {
    pub is_public: bool,
}

/// Query string of `GET /api/encounter-tables`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTablesQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}
