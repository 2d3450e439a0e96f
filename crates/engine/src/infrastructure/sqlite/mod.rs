//! SQLite adapters for the creature store and encounter tables.
//!
//! Both adapters share one pool. Snapshots, filters and creature records
//! are stored as JSON text and validated on the way back out.

mod creature_repo;
mod encounter_table_repo;


pub use creature_repo::SqliteCreatureRepo;
pub use encounter_table_repo::SqliteEncounterTableRepo;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS official_creatures (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        challenge_level INTEGER NOT NULL,
        speed TEXT NOT NULL DEFAULT '',
        movement_types TEXT NOT NULL DEFAULT '[]',
        description TEXT,
        record_json TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_official_creatures_level ON official_creatures (challenge_level)",
    r#"
    CREATE TABLE IF NOT EXISTS user_creatures (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        is_public INTEGER NOT NULL DEFAULT 0,
        name TEXT NOT NULL,
        challenge_level INTEGER NOT NULL,
        speed TEXT NOT NULL DEFAULT '',
        movement_types TEXT NOT NULL DEFAULT '[]',
        description TEXT,
        record_json TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_user_creatures_owner ON user_creatures (owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_user_creatures_public ON user_creatures (is_public, challenge_level)",
    r#"
    CREATE TABLE IF NOT EXISTS encounter_tables (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        die_size INTEGER NOT NULL CHECK (die_size BETWEEN 2 AND 1000),
        filter_json TEXT NOT NULL,
        is_public INTEGER NOT NULL DEFAULT 0,
        public_slug TEXT UNIQUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((is_public = 1) = (public_slug IS NOT NULL))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_encounter_tables_owner ON encounter_tables (owner_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS encounter_table_entries (
        id TEXT PRIMARY KEY,
        table_id TEXT NOT NULL REFERENCES encounter_tables (id) ON DELETE CASCADE,
        roll_number INTEGER NOT NULL CHECK (roll_number >= 1),
        creature_id TEXT NOT NULL,
        creature_partition TEXT NOT NULL,
        snapshot_json TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (table_id, roll_number),
        UNIQUE (table_id, creature_id)
    )
    "#,
];

/// Open (creating if needed) the database at `db_path`.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path))
        .map_err(|e| RepoError::database("connect", e))?
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|e| RepoError::database("connect", e))
}

/// Create tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("ensure_schema", e))?;
    }
    Ok(())
}

/// Map a write failure, surfacing uniqueness violations as constraint errors.
pub(crate) fn write_error(operation: &'static str, e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::constraint(format!("{}: {}", operation, db.message()))
        }
        _ => RepoError::database(operation, e),
    }
}

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("bad timestamp '{}': {}", raw, e)))
}

pub(crate) fn parse_column<T>(raw: &str, column: &str) -> Result<T, RepoError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| RepoError::serialization(format!("bad {} '{}': {}", column, raw, e)))
}
