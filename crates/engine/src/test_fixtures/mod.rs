//! Shared test helpers: creature record builders and in-memory adapters.
//!
//! The in-memory repositories enforce the same uniqueness rules as the SQLite
//! schema, so use-case scenarios can check table invariants end to end
//! without a database.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{creatures, InMemoryCreatureRepo};
//!
//! let repo = InMemoryCreatureRepo::with_records(creatures::official_pack(6, 3));
//! ```

mod in_memory;

pub use in_memory::{InMemoryCreatureRepo, InMemoryEncounterTableRepo};

use chrono::{DateTime, TimeZone, Utc};

/// Fixed instant used by scenario tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

// =============================================================================
// Creature Records
// =============================================================================

pub mod creatures {
    use tablesmith_domain::{
        AbilityScores, Attack, CreatureId, CreaturePartition, CreatureRecord, UserId,
    };

    /// Official catalog creature with one attack.
    pub fn official(name: &str, level: i64) -> CreatureRecord {
        let mut record = CreatureRecord::official(CreatureId::new(), name, level);
        record.attacks.push(Attack {
            name: "Claw".to_string(),
            bonus: 2,
            damage: "1d6".to_string(),
            damage_type: "slashing".to_string(),
            range: None,
            description: None,
        });
        record
    }

    /// `count` official creatures all at `level`.
    pub fn official_pack(count: usize, level: i64) -> Vec<CreatureRecord> {
        (1..=count)
            .map(|i| official(&format!("Beast {}", i), level))
            .collect()
    }

    /// Homebrew creature carrying raw ability scores instead of modifiers.
    pub fn homebrew(owner: UserId, name: &str, level: i64, is_public: bool) -> CreatureRecord {
        let mut record = CreatureRecord::official(CreatureId::new(), name, level);
        record.partition = if is_public {
            CreaturePartition::Public
        } else {
            CreaturePartition::Own
        };
        record.owner_id = Some(owner);
        record.is_public = is_public;
        record.movement_types = None;
        record.speed = "near, fly".to_string();
        record.ability_modifiers = None;
        record.ability_scores = Some(AbilityScores {
            str: 14,
            dex: 9,
            con: 12,
            int: 10,
            wis: 8,
            cha: 17,
        });
        record
    }
}
