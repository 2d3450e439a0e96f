//! Snapshot builder.
//!
//! Fetches full creature records and freezes them into self-contained
//! snapshots. Batch builds fan out on a `JoinSet` bounded by a semaphore.

use std::sync::Arc;

use tablesmith_domain::{
    CreatureCandidate, CreatureId, CreaturePartition, CreatureRecord, CreatureSnapshot,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::infrastructure::ports::{ClockPort, CreatureRepo, CreatureScope, RepoError, Requester};

use super::error::EncounterError;

#[derive(Clone)]
pub struct SnapshotBuilder {
    creatures: Arc<dyn CreatureRepo>,
    clock: Arc<dyn ClockPort>,
    concurrency: usize,
}

impl SnapshotBuilder {
    pub fn new(
        creatures: Arc<dyn CreatureRepo>,
        clock: Arc<dyn ClockPort>,
        concurrency: usize,
    ) -> Self {
        Self {
            creatures,
            clock,
            concurrency: concurrency.max(1),
        }
    }

    /// Snapshot one candidate from the partition it was resolved in.
    pub async fn build(
        &self,
        candidate: CreatureCandidate,
        requester: &Requester,
    ) -> Result<CreatureSnapshot, EncounterError> {
        let scope = CreatureScope::for_partition(candidate.partition, requester).ok_or_else(
            || EncounterError::unavailable(candidate.id, "own creatures require a signed-in user"),
        )?;
        let record = self.fetch(scope, candidate.id).await?.ok_or_else(|| {
            EncounterError::unavailable(
                candidate.id,
                format!("not found among {} creatures", candidate.partition),
            )
        })?;
        self.freeze(record)
    }

    /// Snapshot a creature picked by id, probing official, own, then public.
    pub async fn build_by_id(
        &self,
        creature_id: CreatureId,
        requester: &Requester,
    ) -> Result<CreatureSnapshot, EncounterError> {
        for partition in CreaturePartition::ALL {
            let Some(scope) = CreatureScope::for_partition(partition, requester) else {
                continue;
            };
            if let Some(record) = self.fetch(scope, creature_id).await? {
                return self.freeze(record);
            }
        }
        Err(EncounterError::unavailable(
            creature_id,
            "no accessible creature with this id",
        ))
    }

    /// Snapshot every candidate concurrently, keeping input order.
    ///
    /// The first failure aborts the remaining builds and is returned.
    pub async fn build_many(
        &self,
        candidates: Vec<CreatureCandidate>,
        requester: &Requester,
    ) -> Result<Vec<CreatureSnapshot>, EncounterError> {
        let total = candidates.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, candidate) in candidates.into_iter().enumerate() {
            let builder = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let requester = *requester;
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| RepoError::database("build_snapshot", e))?;
                let snapshot = builder.build(candidate, &requester).await?;
                Ok::<_, EncounterError>((index, snapshot))
            });
        }

        let mut slots: Vec<Option<CreatureSnapshot>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| EncounterError::from(RepoError::database("build_snapshot", e)))
                .and_then(|built| built);
            match outcome {
                Ok((index, snapshot)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(snapshot);
                    }
                }
                Err(e) => {
                    tasks.abort_all();
                    tracing::debug!(error = %e, total, "Snapshot batch aborted");
                    return Err(e);
                }
            }
        }

        slots.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
            EncounterError::from(RepoError::database(
                "build_snapshot",
                "snapshot batch finished with missing results",
            ))
        })
    }

    async fn fetch(
        &self,
        scope: CreatureScope,
        id: CreatureId,
    ) -> Result<Option<CreatureRecord>, EncounterError> {
        match self.creatures.get_full(scope, id).await {
            Ok(record) => Ok(record),
            Err(RepoError::Serialization(reason)) => Err(EncounterError::unavailable(id, reason)),
            Err(e) => Err(e.into()),
        }
    }

    fn freeze(&self, record: CreatureRecord) -> Result<CreatureSnapshot, EncounterError> {
        let id = record.id;
        CreatureSnapshot::from_record(record, self.clock.now())
            .map_err(|e| EncounterError::unavailable(id, e.to_string()))
    }
}
