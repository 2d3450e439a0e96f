//! SQLite-backed creature store (official catalog + homebrew).

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tablesmith_domain::{
    CreatureCriteria, CreatureId, CreaturePartition, CreatureRecord, CreatureSummary, UserId,
};

use super::{parse_column, write_error};
use crate::infrastructure::ports::{CreatureRepo, CreatureScope, RepoError};

/// SQLite implementation of the creature repository.
///
/// The level window is applied in SQL; movement and search go through the
/// shared `CreatureCriteria` predicate so every adapter agrees on matching.
pub struct SqliteCreatureRepo {
    pool: SqlitePool,
}

impl SqliteCreatureRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn summary_from_row(
        row: &SqliteRow,
        partition: CreaturePartition,
    ) -> Result<CreatureSummary, RepoError> {
        let id: String = row.get("id");
        let level: i64 = row.get("challenge_level");
        let movement: String = row.get("movement_types");
        Ok(CreatureSummary {
            id: parse_column(&id, "creature id")?,
            partition,
            name: row.get("name"),
            challenge_level: u8::try_from(level)
                .map_err(|_| RepoError::serialization(format!("bad challenge level {}", level)))?,
            speed: row.get("speed"),
            movement_types: serde_json::from_str(&movement)
                .map_err(|e| RepoError::serialization(e.to_string()))?,
            description: row.get("description"),
        })
    }
}

#[async_trait]
impl CreatureRepo for SqliteCreatureRepo {
    async fn query(
        &self,
        scope: CreatureScope,
        criteria: &CreatureCriteria,
    ) -> Result<Vec<CreatureSummary>, RepoError> {
        const COLUMNS: &str = "id, name, challenge_level, speed, movement_types, description";
        let min = i64::from(criteria.level_range.min);
        let max = i64::from(criteria.level_range.max);

        let rows = match scope {
            CreatureScope::Official => sqlx::query(&format!(
                "SELECT {} FROM official_creatures \
                 WHERE challenge_level BETWEEN ? AND ? ORDER BY name, id",
                COLUMNS
            ))
            .bind(min)
            .bind(max)
            .fetch_all(&self.pool)
            .await,
            CreatureScope::OwnedBy(owner) => sqlx::query(&format!(
                "SELECT {} FROM user_creatures \
                 WHERE owner_id = ? AND challenge_level BETWEEN ? AND ? ORDER BY name, id",
                COLUMNS
            ))
            .bind(owner.to_string())
            .bind(min)
            .bind(max)
            .fetch_all(&self.pool)
            .await,
            CreatureScope::Public => sqlx::query(&format!(
                "SELECT {} FROM user_creatures \
                 WHERE is_public = 1 AND challenge_level BETWEEN ? AND ? ORDER BY name, id",
                COLUMNS
            ))
            .bind(min)
            .bind(max)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|e| RepoError::database("query_creatures", e))?;

        let partition = scope.partition();
        let mut matches = Vec::with_capacity(rows.len());
        for row in &rows {
            let summary = Self::summary_from_row(row, partition)?;
            if criteria.matches(&summary) {
                matches.push(summary);
            }
        }
        Ok(matches)
    }

    async fn get_full(
        &self,
        scope: CreatureScope,
        id: CreatureId,
    ) -> Result<Option<CreatureRecord>, RepoError> {
        let row = match scope {
            CreatureScope::Official => {
                sqlx::query(
                    "SELECT record_json, NULL AS owner_id, 0 AS is_public \
                     FROM official_creatures WHERE id = ?",
                )
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
            }
            CreatureScope::OwnedBy(owner) => {
                sqlx::query(
                    "SELECT record_json, owner_id, is_public FROM user_creatures \
                     WHERE id = ? AND owner_id = ?",
                )
                .bind(id.to_string())
                .bind(owner.to_string())
                .fetch_optional(&self.pool)
                .await
            }
            CreatureScope::Public => {
                sqlx::query(
                    "SELECT record_json, owner_id, is_public FROM user_creatures \
                     WHERE id = ? AND is_public = 1",
                )
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| RepoError::database("get_creature", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let json: String = row.get("record_json");
        let mut record: CreatureRecord =
            serde_json::from_str(&json).map_err(|e| RepoError::serialization(e.to_string()))?;

        // Columns are authoritative over whatever the JSON carried.
        let owner: Option<String> = row.get("owner_id");
        let is_public: i64 = row.get("is_public");
        record.id = id;
        record.partition = scope.partition();
        record.owner_id = owner
            .map(|o| parse_column::<UserId>(&o, "owner id"))
            .transpose()?;
        record.is_public = is_public != 0;
        Ok(Some(record))
    }

    async fn upsert(&self, record: &CreatureRecord) -> Result<(), RepoError> {
        let json =
            serde_json::to_string(record).map_err(|e| RepoError::serialization(e.to_string()))?;
        let movement = serde_json::to_string(&record.movement_types.clone().unwrap_or_default())
            .map_err(|e| RepoError::serialization(e.to_string()))?;

        let result = match record.partition {
            CreaturePartition::Official => {
                sqlx::query(
                    r#"
                    INSERT INTO official_creatures
                        (id, name, challenge_level, speed, movement_types, description, record_json)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        challenge_level = excluded.challenge_level,
                        speed = excluded.speed,
                        movement_types = excluded.movement_types,
                        description = excluded.description,
                        record_json = excluded.record_json
                    "#,
                )
                .bind(record.id.to_string())
                .bind(&record.name)
                .bind(record.challenge_level)
                .bind(&record.speed)
                .bind(movement)
                .bind(&record.description)
                .bind(json)
                .execute(&self.pool)
                .await
            }
            CreaturePartition::Own | CreaturePartition::Public => {
                let owner = record.owner_id.ok_or_else(|| {
                    RepoError::constraint(format!("creature {} has no owner", record.id))
                })?;
                sqlx::query(
                    r#"
                    INSERT INTO user_creatures
                        (id, owner_id, is_public, name, challenge_level, speed,
                         movement_types, description, record_json)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET
                        owner_id = excluded.owner_id,
                        is_public = excluded.is_public,
                        name = excluded.name,
                        challenge_level = excluded.challenge_level,
                        speed = excluded.speed,
                        movement_types = excluded.movement_types,
                        description = excluded.description,
                        record_json = excluded.record_json
                    "#,
                )
                .bind(record.id.to_string())
                .bind(owner.to_string())
                .bind(record.is_public)
                .bind(&record.name)
                .bind(record.challenge_level)
                .bind(&record.speed)
                .bind(movement)
                .bind(&record.description)
                .bind(json)
                .execute(&self.pool)
                .await
            }
        };

        result.map_err(|e| write_error("upsert_creature", e))?;
        Ok(())
    }
}
