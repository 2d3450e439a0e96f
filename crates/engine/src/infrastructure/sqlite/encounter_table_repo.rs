//! SQLite-backed encounter table storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tablesmith_domain::{
    CreatureRef, CreatureSnapshot, DieSize, EncounterFilter, EncounterTable, EncounterTableEntry,
    PublicSlug, RollNumber, TableDescription, TableId, TableName, TableVisibility, UserId,
};

use super::{format_timestamp, parse_column, parse_timestamp, write_error};
use crate::infrastructure::ports::{EncounterTableRepo, RepoError};

const TABLE_COLUMNS: &str = "id, owner_id, name, description, die_size, filter_json, \
                             is_public, public_slug, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, table_id, roll_number, creature_id, creature_partition, \
                             snapshot_json, created_at, updated_at";

/// SQLite implementation of the encounter table repository.
pub struct SqliteEncounterTableRepo {
    pool: SqlitePool,
}

impl SqliteEncounterTableRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn table_from_row(row: &SqliteRow) -> Result<EncounterTable, RepoError> {
        let id: String = row.get("id");
        let owner: String = row.get("owner_id");
        let name: String = row.get("name");
        let description: Option<String> = row.get("description");
        let die_size: i64 = row.get("die_size");
        let filter_json: String = row.get("filter_json");
        let is_public: i64 = row.get("is_public");
        let slug: Option<String> = row.get("public_slug");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        let filter: EncounterFilter = serde_json::from_str(&filter_json)
            .map_err(|e| RepoError::serialization(format!("table {} filter: {}", id, e)))?;

        let visibility = match (is_public != 0, slug) {
            (true, Some(slug)) => TableVisibility::Public(
                PublicSlug::new(slug).map_err(|e| RepoError::serialization(e.to_string()))?,
            ),
            (false, _) => TableVisibility::Private,
            (true, None) => {
                return Err(RepoError::serialization(format!(
                    "table {} is public without a slug",
                    id
                )))
            }
        };

        Ok(EncounterTable {
            id: parse_column(&id, "table id")?,
            owner_id: parse_column::<UserId>(&owner, "owner id")?,
            name: TableName::new(name).map_err(|e| RepoError::serialization(e.to_string()))?,
            description: TableDescription::parse_optional(description.as_deref())
                .map_err(|e| RepoError::serialization(e.to_string()))?,
            die_size: DieSize::from_i64(die_size)
                .map_err(|e| RepoError::serialization(e.to_string()))?,
            filter,
            visibility,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    fn entry_from_row(row: &SqliteRow) -> Result<EncounterTableEntry, RepoError> {
        let id: String = row.get("id");
        let table_id: String = row.get("table_id");
        let roll: i64 = row.get("roll_number");
        let creature_id: String = row.get("creature_id");
        let partition: String = row.get("creature_partition");
        let snapshot_json: String = row.get("snapshot_json");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        let snapshot: CreatureSnapshot = serde_json::from_str(&snapshot_json)
            .map_err(|e| RepoError::serialization(format!("entry {} snapshot: {}", id, e)))?;
        snapshot
            .validate()
            .map_err(|e| RepoError::serialization(format!("entry {} snapshot: {}", id, e)))?;

        let roll_number = u16::try_from(roll)
            .ok()
            .and_then(|r| RollNumber::new(r).ok())
            .ok_or_else(|| RepoError::serialization(format!("bad roll number {}", roll)))?;

        Ok(EncounterTableEntry {
            id: parse_column(&id, "entry id")?,
            table_id: parse_column(&table_id, "table id")?,
            roll_number,
            creature_ref: CreatureRef {
                id: parse_column(&creature_id, "creature id")?,
                partition: parse_column(&partition, "creature partition")?,
            },
            snapshot,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    async fn insert_entry(
        tx: &mut Transaction<'_, Sqlite>,
        entry: &EncounterTableEntry,
        operation: &'static str,
    ) -> Result<(), RepoError> {
        let snapshot = serde_json::to_string(&entry.snapshot)
            .map_err(|e| RepoError::serialization(e.to_string()))?;

        sqlx::query(&format!(
            "INSERT INTO encounter_table_entries ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            ENTRY_COLUMNS
        ))
        .bind(entry.id.to_string())
        .bind(entry.table_id.to_string())
        .bind(i64::from(entry.roll_number.get()))
        .bind(entry.creature_ref.id.to_string())
        .bind(entry.creature_ref.partition.as_str())
        .bind(snapshot)
        .bind(format_timestamp(entry.created_at))
        .bind(format_timestamp(entry.updated_at))
        .execute(&mut **tx)
        .await
        .map_err(|e| write_error(operation, e))?;
        Ok(())
    }
}

#[async_trait]
impl EncounterTableRepo for SqliteEncounterTableRepo {
    async fn insert_table(&self, table: &EncounterTable) -> Result<(), RepoError> {
        let filter = serde_json::to_string(&table.filter)
            .map_err(|e| RepoError::serialization(e.to_string()))?;

        sqlx::query(&format!(
            "INSERT INTO encounter_tables ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TABLE_COLUMNS
        ))
        .bind(table.id.to_string())
        .bind(table.owner_id.to_string())
        .bind(table.name.as_str())
        .bind(table.description.as_ref().map(TableDescription::as_str))
        .bind(i64::from(table.die_size.get()))
        .bind(filter)
        .bind(table.is_public())
        .bind(table.public_slug().map(PublicSlug::as_str))
        .bind(format_timestamp(table.created_at))
        .bind(format_timestamp(table.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("insert_table", e))?;
        Ok(())
    }

    async fn get_table(&self, id: TableId) -> Result<Option<EncounterTable>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM encounter_tables WHERE id = ?",
            TABLE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("get_table", e))?;

        row.as_ref().map(Self::table_from_row).transpose()
    }

    async fn get_table_by_slug(
        &self,
        slug: &PublicSlug,
    ) -> Result<Option<EncounterTable>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM encounter_tables WHERE public_slug = ?",
            TABLE_COLUMNS
        ))
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("get_table_by_slug", e))?;

        row.as_ref().map(Self::table_from_row).transpose()
    }

    async fn update_table(&self, table: &EncounterTable) -> Result<(), RepoError> {
        let filter = serde_json::to_string(&table.filter)
            .map_err(|e| RepoError::serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE encounter_tables SET
                name = ?,
                description = ?,
                filter_json = ?,
                is_public = ?,
                public_slug = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(table.name.as_str())
        .bind(table.description.as_ref().map(TableDescription::as_str))
        .bind(filter)
        .bind(table.is_public())
        .bind(table.public_slug().map(PublicSlug::as_str))
        .bind(format_timestamp(table.updated_at))
        .bind(table.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("update_table", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("EncounterTable", table.id));
        }
        Ok(())
    }

    async fn delete_table(&self, id: TableId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM encounter_tables WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("delete_table", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_entries(&self, entries: &[EncounterTableEntry]) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("insert_entries", e))?;

        for entry in entries {
            Self::insert_entry(&mut tx, entry, "insert_entries").await?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("insert_entries", e))
    }

    async fn list_entries(
        &self,
        table_id: TableId,
    ) -> Result<Vec<EncounterTableEntry>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM encounter_table_entries WHERE table_id = ? ORDER BY roll_number",
            ENTRY_COLUMNS
        ))
        .bind(table_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("list_entries", e))?;

        rows.iter().map(Self::entry_from_row).collect()
    }

    async fn get_entry(
        &self,
        table_id: TableId,
        roll: RollNumber,
    ) -> Result<Option<EncounterTableEntry>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM encounter_table_entries WHERE table_id = ? AND roll_number = ?",
            ENTRY_COLUMNS
        ))
        .bind(table_id.to_string())
        .bind(i64::from(roll.get()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("get_entry", e))?;

        row.as_ref().map(Self::entry_from_row).transpose()
    }

    async fn update_entry(&self, entry: &EncounterTableEntry) -> Result<(), RepoError> {
        let snapshot = serde_json::to_string(&entry.snapshot)
            .map_err(|e| RepoError::serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE encounter_table_entries SET
                creature_id = ?,
                creature_partition = ?,
                snapshot_json = ?,
                updated_at = ?
            WHERE table_id = ? AND roll_number = ?
            "#,
        )
        .bind(entry.creature_ref.id.to_string())
        .bind(entry.creature_ref.partition.as_str())
        .bind(snapshot)
        .bind(format_timestamp(entry.updated_at))
        .bind(entry.table_id.to_string())
        .bind(i64::from(entry.roll_number.get()))
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("update_entry", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found(
                "EncounterTableEntry",
                format!("{}#{}", entry.table_id, entry.roll_number),
            ));
        }
        Ok(())
    }

    async fn replace_all_entries(
        &self,
        table_id: TableId,
        entries: &[EncounterTableEntry],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("replace_all_entries", e))?;

        let touched = sqlx::query("UPDATE encounter_tables SET updated_at = ? WHERE id = ?")
            .bind(format_timestamp(updated_at))
            .bind(table_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("replace_all_entries", e))?;
        if touched.rows_affected() == 0 {
            return Err(RepoError::not_found("EncounterTable", table_id));
        }

        sqlx::query("DELETE FROM encounter_table_entries WHERE table_id = ?")
            .bind(table_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("replace_all_entries", e))?;

        for entry in entries {
            Self::insert_entry(&mut tx, entry, "replace_all_entries").await?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("replace_all_entries", e))
    }

    async fn slug_exists(&self, slug: &PublicSlug) -> Result<bool, RepoError> {
        let row = sqlx::query("SELECT 1 FROM encounter_tables WHERE public_slug = ?")
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("slug_exists", e))?;
        Ok(row.is_some())
    }

    async fn list_for_owner(
        &self,
        owner: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<EncounterTable>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM encounter_tables WHERE owner_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            TABLE_COLUMNS
        ))
        .bind(owner.to_string())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("list_for_owner", e))?;

        rows.iter().map(Self::table_from_row).collect()
    }

    async fn count_for_owner(&self, owner: UserId) -> Result<u64, RepoError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM encounter_tables WHERE owner_id = ?")
            .bind(owner.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::database("count_for_owner", e))?;
        let total: i64 = row.get("total");
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
