//! Filter resolver.
//!
//! Turns an encounter filter into the pool of creatures a table may draw
//! from, querying every requested source concurrently.

use futures_util::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tablesmith_domain::{CreatureCandidate, CreatureRef, EncounterFilter};

use crate::infrastructure::ports::{CreatureRepo, CreatureScope, Requester};

use super::error::EncounterError;

pub struct ResolveCandidates {
    creatures: Arc<dyn CreatureRepo>,
}

impl ResolveCandidates {
    pub fn new(creatures: Arc<dyn CreatureRepo>) -> Self {
        Self { creatures }
    }

    /// Resolve `filter` into an ordered, de-duplicated candidate pool.
    ///
    /// Sources are merged official, own, public; a creature visible through
    /// more than one source keeps the first partition it was seen in.
    ///
    /// # Errors
    ///
    /// `InvalidFilter` before any I/O; `Persistence` if any source fails.
    pub async fn execute(
        &self,
        filter: &EncounterFilter,
        requester: &Requester,
    ) -> Result<Vec<CreatureCandidate>, EncounterError> {
        filter
            .validate()
            .map_err(|e| EncounterError::InvalidFilter(e.to_string()))?;

        let criteria = filter.criteria();
        // BTreeSet iteration is the canonical source order
        let scopes: Vec<CreatureScope> = filter
            .sources
            .iter()
            .filter_map(|partition| CreatureScope::for_partition(*partition, requester))
            .collect();

        if scopes.len() < filter.sources.len() {
            tracing::debug!("Anonymous requester: skipping own-creature source");
        }

        let per_source = try_join_all(scopes.iter().map(|scope| {
            let criteria = &criteria;
            async move {
                let found = self.creatures.query(*scope, criteria).await?;
                Ok::<_, EncounterError>((scope.partition(), found))
            }
        }))
        .await?;

        let mut seen = HashSet::new();
        let mut pool = Vec::new();
        for (partition, found) in per_source {
            tracing::debug!(source = %partition, count = found.len(), "Creature source resolved");
            for summary in found {
                if seen.insert(summary.id) {
                    pool.push(CreatureRef {
                        id: summary.id,
                        partition,
                    });
                }
            }
        }

        tracing::debug!(pool_size = pool.len(), "Candidate pool resolved");
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockCreatureRepo, RepoError};
    use tablesmith_domain::{CreatureId, CreaturePartition, CreatureSummary, UserId};

    fn summary(id: CreatureId, partition: CreaturePartition) -> CreatureSummary {
        CreatureSummary {
            id,
            partition,
            name: format!("Creature {}", id),
            challenge_level: 3,
            speed: "near".to_string(),
            movement_types: vec![],
            description: None,
        }
    }

    #[tokio::test]
    async fn invalid_filter_fails_without_io() {
        // No expectations: any repository call panics
        let repo = MockCreatureRepo::new();
        let resolver = ResolveCandidates::new(Arc::new(repo));

        let empty = EncounterFilter::new([]);
        let result = resolver.execute(&empty, &Requester::Anonymous).await;
        assert!(matches!(result, Err(EncounterError::InvalidFilter(_))));

        let inverted = EncounterFilter::new([CreaturePartition::Official]).with_levels(9, 2);
        let result = resolver.execute(&inverted, &Requester::Anonymous).await;
        assert!(matches!(result, Err(EncounterError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn merges_sources_in_canonical_order_and_dedupes() {
        let user = UserId::new();
        let official_id = CreatureId::new();
        let shared_id = CreatureId::new();
        let public_only_id = CreatureId::new();

        let mut repo = MockCreatureRepo::new();
        repo.expect_query()
            .withf(|scope, _| *scope == CreatureScope::Official)
            .times(1)
            .returning(move |_, _| Ok(vec![summary(official_id, CreaturePartition::Official)]));
        repo.expect_query()
            .withf(move |scope, _| *scope == CreatureScope::OwnedBy(user))
            .times(1)
            .returning(move |_, _| Ok(vec![summary(shared_id, CreaturePartition::Own)]));
        repo.expect_query()
            .withf(|scope, _| *scope == CreatureScope::Public)
            .times(1)
            .returning(move |_, _| {
                Ok(vec![
                    summary(shared_id, CreaturePartition::Public),
                    summary(public_only_id, CreaturePartition::Public),
                ])
            });

        let resolver = ResolveCandidates::new(Arc::new(repo));
        // Insertion order of the set is irrelevant
        let filter = EncounterFilter::new([
            CreaturePartition::Public,
            CreaturePartition::Own,
            CreaturePartition::Official,
        ]);
        let pool = resolver
            .execute(&filter, &Requester::User(user))
            .await
            .expect("resolved");

        assert_eq!(
            pool,
            vec![
                CreatureRef {
                    id: official_id,
                    partition: CreaturePartition::Official
                },
                CreatureRef {
                    id: shared_id,
                    partition: CreaturePartition::Own
                },
                CreatureRef {
                    id: public_only_id,
                    partition: CreaturePartition::Public
                },
            ]
        );
    }

    #[tokio::test]
    async fn anonymous_requester_skips_own_source() {
        let mut repo = MockCreatureRepo::new();
        repo.expect_query()
            .withf(|scope, _| *scope == CreatureScope::Official)
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let resolver = ResolveCandidates::new(Arc::new(repo));
        let filter = EncounterFilter::new([CreaturePartition::Official, CreaturePartition::Own]);
        let pool = resolver
            .execute(&filter, &Requester::Anonymous)
            .await
            .expect("resolved");
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn passes_filter_criteria_to_repository() {
        let mut repo = MockCreatureRepo::new();
        repo.expect_query()
            .withf(|_, criteria| criteria.level_range.min == 4 && criteria.level_range.max == 6)
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let resolver = ResolveCandidates::new(Arc::new(repo));
        let filter = EncounterFilter::new([CreaturePartition::Official]).with_levels(4, 6);
        resolver
            .execute(&filter, &Requester::Anonymous)
            .await
            .expect("resolved");
    }

    #[tokio::test]
    async fn any_source_failure_fails_resolution() {
        let mut repo = MockCreatureRepo::new();
        repo.expect_query()
            .withf(|scope, _| *scope == CreatureScope::Official)
            .returning(|_, _| Ok(vec![summary(CreatureId::new(), CreaturePartition::Official)]));
        repo.expect_query()
            .withf(|scope, _| *scope == CreatureScope::Public)
            .returning(|_, _| Err(RepoError::database("query_creatures", "connection reset")));

        let resolver = ResolveCandidates::new(Arc::new(repo));
        let filter =
            EncounterFilter::new([CreaturePartition::Official, CreaturePartition::Public]);
        let result = resolver.execute(&filter, &Requester::Anonymous).await;
        assert!(matches!(result, Err(EncounterError::Persistence(_))));
    }
}
