//! Unique sampler over the injected random source.

use std::collections::HashSet;
use std::sync::Arc;
use tablesmith_domain::{sample_without_replacement, CreatureCandidate, CreatureId};

use crate::infrastructure::ports::RandomPort;

use super::error::EncounterError;

/// Draws distinct creatures from a candidate pool.
pub struct UniqueSampler {
    random: Arc<dyn RandomPort>,
}

impl UniqueSampler {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }

    /// Exactly `n` distinct candidates, none of them in `excluded`.
    ///
    /// # Errors
    ///
    /// `InsufficientCandidates` when fewer than `n` remain; never a partial draw.
    pub fn sample(
        &self,
        pool: &[CreatureCandidate],
        n: usize,
        excluded: &HashSet<CreatureId>,
    ) -> Result<Vec<CreatureCandidate>, EncounterError> {
        let drawn = sample_without_replacement(
            pool,
            n,
            |c| c.id,
            excluded,
            |upper| self.random.gen_index(upper),
        )
        .inspect_err(|e| {
            tracing::debug!(needed = e.needed, available = e.available, "Candidate pool too small");
        })?;
        Ok(drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockRandomPort;
    use tablesmith_domain::{CreaturePartition, CreatureRef};

    fn pool(n: usize) -> Vec<CreatureCandidate> {
        (0..n)
            .map(|_| CreatureRef {
                id: CreatureId::new(),
                partition: CreaturePartition::Official,
            })
            .collect()
    }

    #[test]
    fn draws_in_pool_order_when_random_picks_first() {
        let mut random = MockRandomPort::new();
        random.expect_gen_index().returning(|_| 0);
        let sampler = UniqueSampler::new(Arc::new(random));

        let candidates = pool(6);
        let drawn = sampler.sample(&candidates, 6, &HashSet::new()).unwrap();
        assert_eq!(drawn, candidates);
    }

    #[test]
    fn excluded_ids_are_never_drawn() {
        let mut random = MockRandomPort::new();
        random.expect_gen_index().returning(|upper| upper - 1);
        let sampler = UniqueSampler::new(Arc::new(random));

        let candidates = pool(6);
        let excluded: HashSet<_> = candidates[..5].iter().map(|c| c.id).collect();
        let drawn = sampler.sample(&candidates, 1, &excluded).unwrap();
        assert_eq!(drawn, vec![candidates[5]]);
    }

    #[test]
    fn too_small_pool_fails_without_drawing() {
        let mut random = MockRandomPort::new();
        random.expect_gen_index().never();
        let sampler = UniqueSampler::new(Arc::new(random));

        let result = sampler.sample(&pool(7), 10, &HashSet::new());
        assert!(matches!(
            result,
            Err(EncounterError::InsufficientCandidates {
                needed: 10,
                available: 7
            })
        ));
    }
}
