//! Validated name newtypes for encounter tables
//!
//! These newtypes ensure that names are valid by construction:
//! - Within length limits
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Minimum length for a table name
pub const MIN_TABLE_NAME_LENGTH: usize = 3;

/// Maximum length for a table name
pub const MAX_TABLE_NAME_LENGTH: usize = 100;

/// Maximum length for a table description
pub const MAX_TABLE_DESCRIPTION_LENGTH: usize = 500;

// ============================================================================
// TableName
// ============================================================================

/// A validated encounter table name (3..=100 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Create a new validated table name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The name is shorter than 3 characters after trimming
    /// - The name exceeds 100 characters after trimming
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        let len = trimmed.chars().count();
        if len < MIN_TABLE_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Table name must be at least {} characters",
                MIN_TABLE_NAME_LENGTH
            )));
        }
        if len > MAX_TABLE_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Table name cannot exceed {} characters",
                MAX_TABLE_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Name used for a copy of a shared table: `"<name> (Copy)"`.
    ///
    /// The original name is shortened on a char boundary so the result
    /// always fits the length limit.
    pub fn copy_of(&self) -> Self {
        const SUFFIX: &str = " (Copy)";
        let room = MAX_TABLE_NAME_LENGTH - SUFFIX.len();
        let base: String = self.0.chars().take(room).collect();
        Self(format!("{}{}", base.trim_end(), SUFFIX))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TableName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> String {
        name.0
    }
}

// ============================================================================
// TableDescription
// ============================================================================

/// A validated table description (<=500 chars, trimmed, never empty)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableDescription(String);

impl TableDescription {
    /// Create a description, treating blank input as "no description".
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the trimmed text exceeds 500 characters.
    pub fn parse_optional(text: Option<&str>) -> Result<Option<Self>, DomainError> {
        match text.map(str::trim) {
            None | Some("") => Ok(None),
            Some(trimmed) => Self::new(trimmed).map(Some),
        }
    }

    pub fn new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Description cannot be blank"));
        }
        if trimmed.chars().count() > MAX_TABLE_DESCRIPTION_LENGTH {
            return Err(DomainError::validation(format!(
                "Description cannot exceed {} characters",
                MAX_TABLE_DESCRIPTION_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TableDescription {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TableDescription> for String {
    fn from(description: TableDescription) -> String {
        description.0
    }
}
