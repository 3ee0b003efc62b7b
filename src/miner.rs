//! Level-wise (Apriori) frequent itemset search

use std::collections::HashSet;
use std::thread;

use serde::Serialize;
use tracing::{debug, warn};

use crate::basket::Baskets;
use crate::config::MiningConfig;
use crate::error::{MiningError, MiningResult};
use crate::itemset::{is_sorted_subset, FrequentItemset, ItemCatalog, ItemId};
use crate::run::CancellationToken;

/// Candidate and frequent counts for one mined level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    /// Itemset size at this level
    pub level: usize,
    /// Candidates counted at this level
    pub candidates: usize,
    /// Candidates that met the minimum support
    pub frequent: usize,
}

/// A candidate or frequent itemset in id form, with its exact count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CountedItemset {
    pub(crate) ids: Vec<ItemId>,
    pub(crate) count: u64,
}

/// Every frequent level of a completed search.
#[derive(Debug, Clone)]
pub(crate) struct FrequentLevels {
    pub(crate) catalog: ItemCatalog,
    pub(crate) transaction_count: usize,
    /// `levels[k - 1]` holds the frequent itemsets of size k in canonical order
    pub(crate) levels: Vec<Vec<CountedItemset>>,
}

impl FrequentLevels {
    /// Decode all frequent itemsets, ordered by size then lexicographically.
    pub(crate) fn itemsets(&self) -> Vec<FrequentItemset> {
        self.levels
            .iter()
            .flatten()
            .map(|counted| FrequentItemset {
                itemset: self.catalog.decode(&counted.ids),
                count: counted.count,
            })
            .collect()
    }
}

/// Apriori search over a basket collection.
#[derive(Debug)]
pub struct ItemsetMiner<'a> {
    config: &'a MiningConfig,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> ItemsetMiner<'a> {
    /// The config is assumed to have passed [`MiningConfig::validate`].
    pub fn new(config: &'a MiningConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Check `token` at every level boundary.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Mine all frequent itemsets, returning them in canonical order.
    pub fn frequent_itemsets(&self, baskets: &Baskets) -> MiningResult<Vec<FrequentItemset>> {
        Ok(self.mine_levels(baskets, |_| {})?.itemsets())
    }

    /// Run the level-wise search.
    ///
    /// # Arguments
    /// * `baskets` - The mining population
    /// * `on_level` - Called once per counted level, before the next level is generated
    ///
    /// # Returns
    /// * The frequent itemsets of every level with exact support counts
    pub(crate) fn mine_levels(
        &self,
        baskets: &Baskets,
        mut on_level: impl FnMut(&LevelSummary),
    ) -> MiningResult<FrequentLevels> {
        let transaction_count = baskets.transaction_count();
        let catalog = ItemCatalog::from_baskets(baskets);
        let encoded = catalog.encode(baskets);
        debug!(
            transactions = transaction_count,
            items = catalog.len(),
            "starting itemset search"
        );

        let mut levels: Vec<Vec<CountedItemset>> = Vec::new();
        let mut generated = 0usize;
        let mut level = 1usize;
        let mut candidates: Vec<Vec<ItemId>> =
            (0..catalog.len()).map(|id| vec![id as ItemId]).collect();

        while !candidates.is_empty() {
            generated = generated.saturating_add(candidates.len());
            if let Some(ceiling) = self.config.candidate_ceiling {
                if generated > ceiling {
                    warn!(level, ceiling, "candidate ceiling exceeded");
                    return Err(MiningError::resource_exceeded(format!(
                        "more than {ceiling} candidate itemsets generated by level {level}"
                    )));
                }
            }

            let counts = count_support(&encoded, &candidates, level, self.config.threads);
            let candidate_count = candidates.len();
            let frequent: Vec<CountedItemset> = candidates
                .into_iter()
                .zip(counts)
                .filter(|&(_, count)| {
                    meets_support(count, transaction_count, self.config.min_support)
                })
                .map(|(ids, count)| CountedItemset { ids, count })
                .collect();

            let summary = LevelSummary {
                level,
                candidates: candidate_count,
                frequent: frequent.len(),
            };
            debug!(
                level,
                candidates = summary.candidates,
                frequent = summary.frequent,
                "counted level"
            );
            on_level(&summary);

            if frequent.is_empty() {
                break;
            }
            levels.push(frequent);

            if self
                .config
                .max_itemset_size
                .is_some_and(|max| level >= max)
            {
                break;
            }

            // Level boundary: the only point a run may be cancelled
            if self.cancel.is_some_and(CancellationToken::is_cancelled) {
                warn!(level, "mining cancelled");
                return Err(MiningError::Cancelled);
            }

            candidates = match levels.last() {
                Some(previous) => generate_candidates(previous),
                None => Vec::new(),
            };
            level += 1;
        }

        Ok(FrequentLevels {
            catalog,
            transaction_count,
            levels,
        })
    }
}

fn meets_support(count: u64, transaction_count: usize, min_support: f64) -> bool {
    transaction_count > 0 && count as f64 / transaction_count as f64 >= min_support
}

/// Join itemsets sharing a size-(k-1) prefix, then drop any candidate with
/// an infrequent size-k subset.
///
/// `frequent` must be in canonical order; the output is too.
fn generate_candidates(frequent: &[CountedItemset]) -> Vec<Vec<ItemId>> {
    let known: HashSet<&[ItemId]> = frequent.iter().map(|f| f.ids.as_slice()).collect();
    let mut candidates = Vec::new();

    for (i, left) in frequent.iter().enumerate() {
        let prefix_len = left.ids.len() - 1;
        let prefix = &left.ids[..prefix_len];
        for right in &frequent[i + 1..] {
            // Sorted order keeps a shared prefix contiguous
            if right.ids[..prefix_len] != *prefix {
                break;
            }
            let mut candidate = left.ids.clone();
            candidate.push(right.ids[prefix_len]);
            if !has_infrequent_subset(&candidate, &known) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

fn has_infrequent_subset(candidate: &[ItemId], known: &HashSet<&[ItemId]>) -> bool {
    // Dropping either of the last two ids gives back the joined parents
    let checked = candidate.len().saturating_sub(2);
    let mut subset = Vec::with_capacity(candidate.len() - 1);
    (0..checked).any(|skip| {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|&(index, _)| index != skip)
                .map(|(_, &id)| id),
        );
        !known.contains(subset.as_slice())
    })
}

/// Count how many baskets contain each candidate, optionally across threads.
fn count_support(
    baskets: &[Vec<ItemId>],
    candidates: &[Vec<ItemId>],
    level: usize,
    threads: usize,
) -> Vec<u64> {
    if threads <= 1 || baskets.len() < 2 {
        return count_shard(baskets, candidates, level);
    }

    let shard_len = baskets.len().div_ceil(threads);
    thread::scope(|scope| {
        let handles: Vec<_> = baskets
            .chunks(shard_len)
            .map(|shard| scope.spawn(move || count_shard(shard, candidates, level)))
            .collect();

        let mut totals = vec![0u64; candidates.len()];
        for handle in handles {
            let partial = match handle.join() {
                Ok(partial) => partial,
                Err(payload) => std::panic::resume_unwind(payload),
            };
            for (total, count) in totals.iter_mut().zip(partial) {
                *total += count;
            }
        }
        totals
    })
}

fn count_shard(baskets: &[Vec<ItemId>], candidates: &[Vec<ItemId>], level: usize) -> Vec<u64> {
    let mut counts = vec![0u64; candidates.len()];

    if level == 1 {
        // Level-1 candidates are every item id in order
        for basket in baskets {
            for &id in basket {
                counts[id as usize] += 1;
            }
        }
        return counts;
    }

    for basket in baskets.iter().filter(|basket| basket.len() >= level) {
        for (count, candidate) in counts.iter_mut().zip(candidates) {
            if is_sorted_subset(candidate, basket) {
                *count += 1;
            }
        }
    }
    counts
}
