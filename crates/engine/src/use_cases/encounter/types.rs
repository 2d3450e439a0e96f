//! Inputs and outputs of the encounter table use cases.

use tablesmith_domain::{CreatureId, DomainError, EncounterFilter, EncounterTableEntry, RollNumber};

/// A table to be generated; validated by the use case.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTable {
    pub name: String,
    pub description: Option<String>,
    pub die_size: i64,
    pub filter: EncounterFilter,
}

/// How a single entry gets its new creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Re-draw from the table's stored filter
    Random,
    /// Use this exact creature, bypassing the filter
    Search { creature_id: CreatureId },
}

/// Metadata changes; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableUpdate {
    pub name: Option<String>,
    /// `Some("")` clears the description
    pub description: Option<String>,
    /// Stored for future replacement and regeneration; entries are not touched
    pub filter: Option<EncounterFilter>,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// `page` starts at 1; `limit` is 1..=100 and defaults to 20.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page == 0 {
            return Err(DomainError::validation("Page must be at least 1"));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(DomainError::validation(format!(
                "Limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

/// Outcome of rolling a table's die.
#[derive(Debug, Clone, PartialEq)]
pub struct RollResult {
    pub roll_number: RollNumber,
    pub entry: EncounterTableEntry,
}
