//! Uniform sampling without replacement
//!
//! The random source is injected as `gen_index(upper) -> 0..upper` so the
//! domain stays free of `rand` and tests can script every draw.

use std::collections::HashSet;
use std::hash::Hash;

use thiserror::Error;

/// The pool had fewer distinct, non-excluded items than requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Need {needed} distinct candidates but only {available} are available")]
pub struct InsufficientCandidates {
    pub needed: usize,
    pub available: usize,
}

/// Draw `n` distinct items from `pool`, skipping any whose key is excluded.
///
/// Duplicate keys in the pool count once (first occurrence wins). Runs a
/// partial Fisher-Yates shuffle, so every `n`-subset is equally likely when
/// `gen_index` is uniform. Never returns a partial result.
pub fn sample_without_replacement<T, K>(
    pool: &[T],
    n: usize,
    key: impl Fn(&T) -> K,
    excluded: &HashSet<K>,
    mut gen_index: impl FnMut(usize) -> usize,
) -> Result<Vec<T>, InsufficientCandidates>
where
    T: Clone,
    K: Eq + Hash,
{
    let mut seen = HashSet::with_capacity(pool.len());
    let mut eligible: Vec<&T> = pool
        .iter()
        .filter(|item| {
            let k = key(item);
            !excluded.contains(&k) && seen.insert(k)
        })
        .collect();

    if eligible.len() < n {
        return Err(InsufficientCandidates {
            needed: n,
            available: eligible.len(),
        });
    }

    for i in 0..n {
        let remaining = eligible.len() - i;
        let j = i + gen_index(remaining) % remaining;
        eligible.swap(i, j);
    }

    Ok(eligible.into_iter().take(n).cloned().collect())
}
