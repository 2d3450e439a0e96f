//! Response bodies returned by the HTTP API
//!
//! Creature snapshots travel as opaque JSON; clients render them as-is.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::requests::EncounterFilterData;

// =============================================================================
// Error Body
// =============================================================================

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request was malformed or invalid
    BadRequest,
    /// Authentication required
    Unauthorized,
    /// User lacks permission for this operation
    Forbidden,
    /// Requested resource not found
    NotFound,
    /// Operation conflicts with current state
    Conflict,
    /// Request data failed validation
    ValidationError,

    // === Server Errors (5xx) ===
    /// Internal server error
    InternalError,
    /// Transient failure, the same request may succeed later
    ServiceUnavailable,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    /// Whether repeating the identical request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable | Self::Conflict)
    }
}

/// JSON body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

// =============================================================================
// Encounter Tables
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTableData {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub die_size: u16,
    pub is_public: bool,
    pub public_slug: Option<String>,
    pub filters: EncounterFilterData,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTableEntryData {
    pub id: Uuid,
    pub table_id: Uuid,
    pub roll_number: u16,
    pub creature_id: Uuid,
    pub creature_source: String,
    pub creature_snapshot: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTableWithEntriesData {
    #[serde(flatten)]
    pub table: EncounterTableData,
    pub entries: Vec<EncounterTableEntryData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResultData {
    pub roll_number: u16,
    pub entry: EncounterTableEntryData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedNameData {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationData {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedData<T> {
    pub data: Vec<T>,
    pub pagination: PaginationData,
}
