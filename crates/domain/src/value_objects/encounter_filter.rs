//! Encounter filter - which creatures may appear on a generated table
//!
//! The filter is stored on the table so the same pool can be re-drawn for
//! single-entry replacement and full regeneration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::entities::CreatureSummary;
use crate::error::DomainError;

/// Lowest challenge level a filter may request
pub const MIN_CHALLENGE_LEVEL: u8 = 1;

/// Highest challenge level a filter may request
pub const MAX_CHALLENGE_LEVEL: u8 = 20;

/// Maximum length of the free-text search
pub const MAX_SEARCH_QUERY_LENGTH: usize = 100;

// ============================================================================
// CreaturePartition
// ============================================================================

/// One of the three creature data sources.
///
/// Declaration order is the canonical merge order used when the same
/// creature is visible from more than one source.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CreaturePartition {
    /// The official catalog
    #[default]
    Official,
    /// The requesting user's own creations (private or shared)
    #[serde(alias = "user")]
    Own,
    /// Creations any user has shared publicly
    Public,
}

impl CreaturePartition {
    pub const ALL: [CreaturePartition; 3] = [Self::Official, Self::Own, Self::Public];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Own => "own",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for CreaturePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreaturePartition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "official" => Ok(Self::Official),
            "own" | "user" => Ok(Self::Own),
            "public" => Ok(Self::Public),
            other => Err(DomainError::parse(format!("Unknown creature source: {}", other))),
        }
    }
}

// ============================================================================
// MovementType
// ============================================================================

/// Special movement a creature can be required to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Fly,
    Swim,
    Burrow,
    Climb,
}

impl MovementType {
    pub const ALL: [MovementType; 4] = [Self::Fly, Self::Swim, Self::Burrow, Self::Climb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fly => "fly",
            Self::Swim => "swim",
            Self::Burrow => "burrow",
            Self::Climb => "climb",
        }
    }

    /// Movement types mentioned in a speed description such as
    /// `"near (climb, fly)"`.
    pub fn mentioned_in(speed: &str) -> Vec<MovementType> {
        let speed = speed.to_lowercase();
        Self::ALL
            .into_iter()
            .filter(|m| speed.contains(m.as_str()))
            .collect()
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fly" => Ok(Self::Fly),
            "swim" => Ok(Self::Swim),
            "burrow" => Ok(Self::Burrow),
            "climb" => Ok(Self::Climb),
            other => Err(DomainError::parse(format!("Unknown movement type: {}", other))),
        }
    }
}

// ============================================================================
// LevelRange
// ============================================================================

/// Inclusive challenge-level window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelRange {
    #[serde(rename = "level_min", default = "default_level_min")]
    pub min: u8,
    #[serde(rename = "level_max", default = "default_level_max")]
    pub max: u8,
}

fn default_level_min() -> u8 {
    MIN_CHALLENGE_LEVEL
}

fn default_level_max() -> u8 {
    MAX_CHALLENGE_LEVEL
}

impl LevelRange {
    pub fn new(min: u8, max: u8) -> Result<Self, DomainError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for bound in [self.min, self.max] {
            if !(MIN_CHALLENGE_LEVEL..=MAX_CHALLENGE_LEVEL).contains(&bound) {
                return Err(DomainError::validation(format!(
                    "Challenge levels must be between {} and {}",
                    MIN_CHALLENGE_LEVEL, MAX_CHALLENGE_LEVEL
                )));
            }
        }
        if self.min > self.max {
            return Err(DomainError::validation(
                "Minimum level must be less than or equal to maximum level",
            ));
        }
        Ok(())
    }

    pub fn contains(&self, level: u8) -> bool {
        (self.min..=self.max).contains(&level)
    }
}

impl Default for LevelRange {
    fn default() -> Self {
        Self {
            min: MIN_CHALLENGE_LEVEL,
            max: MAX_CHALLENGE_LEVEL,
        }
    }
}

// ============================================================================
// SearchQuery
// ============================================================================

/// Case-insensitive substring search over name and description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Parse optional search text; blank input means "no search".
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
            return Err(DomainError::validation("Search query cannot be blank"));
        }
        if trimmed.chars().count() > MAX_SEARCH_QUERY_LENGTH {
            return Err(DomainError::validation(format!(
                "Search query cannot exceed {} characters",
                MAX_SEARCH_QUERY_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SearchQuery {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SearchQuery> for String {
    fn from(query: SearchQuery) -> String {
        query.0
    }
}

// ============================================================================
// EncounterFilter
// ============================================================================

/// The resolved filter a table was generated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterFilter {
    pub sources: BTreeSet<CreaturePartition>,
    #[serde(flatten)]
    pub level_range: LevelRange,
    #[serde(default)]
    pub movement_types: BTreeSet<MovementType>,
    #[serde(default)]
    pub search_query: Option<SearchQuery>,
}

impl EncounterFilter {
    pub fn new(sources: impl IntoIterator<Item = CreaturePartition>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            level_range: LevelRange::default(),
            movement_types: BTreeSet::new(),
            search_query: None,
        }
    }

    pub fn with_levels(mut self, min: u8, max: u8) -> Self {
        self.level_range = LevelRange { min, max };
        self
    }

    pub fn with_movement(mut self, movement: impl IntoIterator<Item = MovementType>) -> Self {
        self.movement_types = movement.into_iter().collect();
        self
    }

    pub fn with_search(mut self, query: SearchQuery) -> Self {
        self.search_query = Some(query);
        self
    }

    /// Check the filter before any I/O happens.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no source is selected or the
    /// level range is inverted or out of bounds.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.sources.is_empty() {
            return Err(DomainError::validation(
                "At least one creature source required",
            ));
        }
        self.level_range.validate()
    }

    /// The I/O-free match predicate for this filter.
    pub fn criteria(&self) -> CreatureCriteria {
        CreatureCriteria {
            level_range: self.level_range,
            movement_types: self.movement_types.clone(),
            search_query: self.search_query.as_ref().map(|q| q.as_str().to_lowercase()),
        }
    }
}

// ============================================================================
// CreatureCriteria
// ============================================================================

/// Per-creature predicate shared by every repository adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureCriteria {
    pub level_range: LevelRange,
    pub movement_types: BTreeSet<MovementType>,
    /// Lowercased search text
    search_query: Option<String>,
}

impl CreatureCriteria {
    pub fn search_text(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    pub fn matches(&self, creature: &CreatureSummary) -> bool {
        self.level_range.contains(creature.challenge_level)
            && self.matches_movement(creature)
            && self.matches_search(creature)
    }

    fn matches_movement(&self, creature: &CreatureSummary) -> bool {
        if self.movement_types.is_empty() {
            return true;
        }
        let speed = creature.speed.to_lowercase();
        self.movement_types.iter().any(|wanted| {
            creature
                .movement_types
                .iter()
                .any(|m| m.eq_ignore_ascii_case(wanted.as_str()))
                || speed.contains(wanted.as_str())
        })
    }

    fn matches_search(&self, creature: &CreatureSummary) -> bool {
        let Some(needle) = self.search_query.as_deref() else {
            return true;
        };
        creature.name.to_lowercase().contains(needle)
            || creature
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}
