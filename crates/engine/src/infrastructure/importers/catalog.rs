//! Official creature catalog importer.
//!
//! Loads a JSON array of creature records and upserts them into the official
//! partition. Records that cannot produce a valid stat block are skipped.

use std::path::PathBuf;

use chrono::Utc;
use tablesmith_domain::{CreaturePartition, CreatureRecord, CreatureSnapshot};
use thiserror::Error;
use tokio::fs;

use crate::infrastructure::ports::{CreatureRepo, RepoError};

/// Errors that can occur during import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Catalog file not found at {0}")]
    CatalogNotFound(PathBuf),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Importer for the official creature catalog.
pub struct CatalogImporter {
    catalog_path: PathBuf,
}

impl CatalogImporter {
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
        }
    }

    /// Read and validate the catalog file without writing anything.
    pub async fn load(&self) -> Result<(Vec<CreatureRecord>, usize), ImportError> {
        if !fs::try_exists(&self.catalog_path).await? {
            return Err(ImportError::CatalogNotFound(self.catalog_path.clone()));
        }

        let content = fs::read_to_string(&self.catalog_path).await?;
        let raw: Vec<CreatureRecord> = serde_json::from_str(&content)?;

        let now = Utc::now();
        let mut valid = Vec::with_capacity(raw.len());
        let mut skipped = 0;
        for mut record in raw {
            record.partition = CreaturePartition::Official;
            record.owner_id = None;
            record.is_public = false;

            match CreatureSnapshot::from_record(record.clone(), now) {
                Ok(_) => valid.push(record),
                Err(e) => {
                    tracing::warn!(
                        creature_id = %record.id,
                        name = %record.name,
                        error = %e,
                        "Skipping invalid catalog creature"
                    );
                    skipped += 1;
                }
            }
        }
        Ok((valid, skipped))
    }

    /// Upsert every valid catalog creature into `repo`.
    pub async fn import_into(&self, repo: &dyn CreatureRepo) -> Result<ImportSummary, ImportError> {
        let (records, skipped) = self.load().await?;
        for record in &records {
            repo.upsert(record).await?;
        }

        let summary = ImportSummary {
            imported: records.len(),
            skipped,
        };
        tracing::info!(
            path = %self.catalog_path.display(),
            imported = summary.imported,
            skipped = summary.skipped,
            "Official creature catalog imported"
        );
        Ok(summary)
    }
}
