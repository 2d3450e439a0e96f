//! Creature entities - catalog records and frozen snapshots
//!
//! A `CreatureRecord` is whatever a creature partition stores: official
//! catalog rows carry ability modifiers, homebrew rows may only carry raw
//! ability scores and may omit the movement-type list. A `CreatureSnapshot`
//! is the normalized, validated copy embedded in a table entry. Once taken it
//! never changes, no matter what happens to the source creature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::ids::{CreatureId, UserId};
use crate::value_objects::{
    CreaturePartition, MovementType, MAX_CHALLENGE_LEVEL, MIN_CHALLENGE_LEVEL,
};

/// Weak reference from a table entry to the creature it was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureRef {
    pub id: CreatureId,
    pub partition: CreaturePartition,
}

/// A creature that matched a filter, tagged with the source it came from
pub type CreatureCandidate = CreatureRef;

/// The fields a filter looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSummary {
    pub id: CreatureId,
    pub partition: CreaturePartition,
    pub name: String,
    pub challenge_level: u8,
    pub speed: String,
    /// Movement types as stored; may be empty for homebrew creatures
    pub movement_types: Vec<String>,
    pub description: Option<String>,
}

impl CreatureSummary {
    pub fn candidate(&self) -> CreatureCandidate {
        CreatureRef {
            id: self.id,
            partition: self.partition,
        }
    }
}

// ============================================================================
// Stat block parts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub name: String,
    #[serde(default)]
    pub bonus: i32,
    pub damage: String,
    #[serde(default)]
    pub damage_type: String,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// e.g. "1/day", "Recharge 5-6"
    #[serde(default)]
    pub usage: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasure {
    #[serde(default)]
    pub copper: u32,
    #[serde(default)]
    pub silver: u32,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub items: Vec<String>,
}

impl Treasure {
    pub fn is_empty(&self) -> bool {
        self.copper == 0 && self.silver == 0 && self.gold == 0 && self.items.is_empty()
    }
}

/// Raw ability scores (3..=18 style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
}

impl AbilityScores {
    /// Modifier for each score: `floor((score - 10) / 2)`
    pub fn modifiers(&self) -> AbilityModifiers {
        let m = |score: i32| (score - 10).div_euclid(2);
        AbilityModifiers {
            str: m(self.str),
            dex: m(self.dex),
            con: m(self.con),
            int: m(self.int),
            wis: m(self.wis),
            cha: m(self.cha),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityModifiers {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    Lawful,
    Neutral,
    Chaotic,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lawful => "Lawful",
            Self::Neutral => "Neutral",
            Self::Chaotic => "Chaotic",
        };
        f.write_str(s)
    }
}

impl FromStr for Alignment {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lawful" | "l" => Ok(Self::Lawful),
            "neutral" | "n" => Ok(Self::Neutral),
            "chaotic" | "c" => Ok(Self::Chaotic),
            other => Err(DomainError::parse(format!("Unknown alignment: {}", other))),
        }
    }
}

// ============================================================================
// CreatureRecord
// ============================================================================

/// A creature as one partition stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureRecord {
    pub id: CreatureId,
    /// Catalog files omit this; it defaults to official
    #[serde(default)]
    pub partition: CreaturePartition,
    /// Creator of a homebrew creature; `None` for the official catalog
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub is_public: bool,
    pub name: String,
    pub challenge_level: i64,
    pub armor_class: i64,
    pub hit_points: i64,
    #[serde(default)]
    pub hit_dice: Option<String>,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub movement_types: Option<Vec<String>>,
    #[serde(default)]
    pub ability_scores: Option<AbilityScores>,
    #[serde(default)]
    pub ability_modifiers: Option<AbilityModifiers>,
    #[serde(default)]
    pub attacks: Vec<Attack>,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub creature_type: Option<String>,
    #[serde(default)]
    pub treasure: Option<Treasure>,
    #[serde(default)]
    pub traits: Option<String>,
    #[serde(default)]
    pub lore: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl CreatureRecord {
    /// Minimal official record, mostly for seeding and tests.
    pub fn official(id: CreatureId, name: impl Into<String>, challenge_level: i64) -> Self {
        Self {
            id,
            partition: CreaturePartition::Official,
            owner_id: None,
            is_public: false,
            name: name.into(),
            challenge_level,
            armor_class: 12,
            hit_points: 9,
            hit_dice: None,
            speed: "near".to_string(),
            movement_types: Some(Vec::new()),
            ability_scores: None,
            ability_modifiers: Some(AbilityModifiers::default()),
            attacks: Vec::new(),
            abilities: Vec::new(),
            alignment: None,
            size: None,
            creature_type: None,
            treasure: None,
            traits: None,
            lore: None,
            description: None,
            icon_url: None,
        }
    }

    pub fn summary(&self) -> CreatureSummary {
        CreatureSummary {
            id: self.id,
            partition: self.partition,
            name: self.name.clone(),
            challenge_level: u8::try_from(self.challenge_level).unwrap_or(0),
            speed: self.speed.clone(),
            movement_types: self.movement_types.clone().unwrap_or_default(),
            description: self.description.clone(),
        }
    }
}

// ============================================================================
// CreatureSnapshot
// ============================================================================

/// Frozen, complete stat block stored on a table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    pub creature_id: CreatureId,
    pub partition: CreaturePartition,
    pub name: String,
    pub challenge_level: u8,
    pub armor_class: u16,
    pub hit_points: u32,
    pub hit_dice: Option<String>,
    pub speed: String,
    pub movement_types: Vec<MovementType>,
    pub attacks: Vec<Attack>,
    pub abilities: Vec<Ability>,
    pub modifiers: AbilityModifiers,
    pub alignment: Option<Alignment>,
    pub size: Option<String>,
    pub creature_type: Option<String>,
    pub treasure: Option<Treasure>,
    pub traits: Option<String>,
    pub lore: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl CreatureSnapshot {
    /// Normalize a partition record into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the record cannot produce a
    /// renderable stat block.
    pub fn from_record(
        record: CreatureRecord,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let challenge_level = u8::try_from(record.challenge_level)
            .ok()
            .filter(|l| (MIN_CHALLENGE_LEVEL..=MAX_CHALLENGE_LEVEL).contains(l))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "Challenge level {} is out of range",
                    record.challenge_level
                ))
            })?;
        let armor_class = u16::try_from(record.armor_class)
            .map_err(|_| DomainError::validation("Armor class must not be negative"))?;
        let hit_points = u32::try_from(record.hit_points)
            .ok()
            .filter(|hp| *hp > 0)
            .ok_or_else(|| DomainError::validation("Hit points must be positive"))?;

        let modifiers = match (record.ability_modifiers, record.ability_scores) {
            (Some(modifiers), _) => modifiers,
            (None, Some(scores)) => scores.modifiers(),
            (None, None) => {
                return Err(DomainError::validation(
                    "Creature has neither ability modifiers nor ability scores",
                ))
            }
        };

        // Listed movement is free text; anything other than fly/swim/burrow/climb is dropped
        let mut movement_types: Vec<MovementType> = record
            .movement_types
            .iter()
            .flatten()
            .filter_map(|m| m.parse().ok())
            .collect();
        movement_types.sort();
        movement_types.dedup();
        if movement_types.is_empty() {
            movement_types = MovementType::mentioned_in(&record.speed);
        }

        let alignment = non_blank(record.alignment)
            .map(|a| a.parse::<Alignment>())
            .transpose()?;

        let snapshot = Self {
            creature_id: record.id,
            partition: record.partition,
            name: record.name.trim().to_string(),
            challenge_level,
            armor_class,
            hit_points,
            hit_dice: non_blank(record.hit_dice),
            speed: record.speed.trim().to_string(),
            movement_types,
            attacks: record.attacks,
            abilities: record.abilities,
            modifiers,
            alignment,
            size: non_blank(record.size),
            creature_type: non_blank(record.creature_type),
            treasure: record.treasure.filter(|t| !t.is_empty()),
            traits: non_blank(record.traits),
            lore: non_blank(record.lore),
            description: non_blank(record.description),
            icon_url: non_blank(record.icon_url),
            captured_at,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check that the snapshot can be rendered on its own.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Creature name cannot be empty"));
        }
        if !(MIN_CHALLENGE_LEVEL..=MAX_CHALLENGE_LEVEL).contains(&self.challenge_level) {
            return Err(DomainError::validation("Challenge level is out of range"));
        }
        if self.hit_points == 0 {
            return Err(DomainError::validation("Hit points must be positive"));
        }
        if self.attacks.iter().any(|a| a.name.trim().is_empty()) {
            return Err(DomainError::validation("Attack name cannot be empty"));
        }
        if self.abilities.iter().any(|a| a.name.trim().is_empty()) {
            return Err(DomainError::validation("Ability name cannot be empty"));
        }
        Ok(())
    }

    pub fn creature_ref(&self) -> CreatureRef {
        CreatureRef {
            id: self.creature_id,
            partition: self.partition,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
