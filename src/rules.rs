//! Association rule generation and ranking

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::config::MiningConfig;
use crate::error::{MiningError, MiningResult};
use crate::itemset::{ItemId, Itemset};
use crate::miner::FrequentLevels;

/// Decimal places kept in reported metrics.
const METRIC_SCALE: u128 = 1000;

/// A directional rule `antecedent -> consequent` drawn from one frequent itemset.
///
/// The exact transaction counts are kept; [`support`](Self::support),
/// [`confidence`](Self::confidence) and [`lift`](Self::lift) report them as
/// fractions rounded half-to-even to 3 decimal places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    /// Transactions containing antecedent and consequent together
    pub itemset_count: u64,
    pub antecedent_count: u64,
    pub consequent_count: u64,
    pub transaction_count: usize,
}

impl AssociationRule {
    pub fn support(&self) -> f64 {
        round_ratio(self.itemset_count as u128, self.transaction_count as u128)
    }

    pub fn confidence(&self) -> f64 {
        round_ratio(self.itemset_count as u128, self.antecedent_count as u128)
    }

    pub fn lift(&self) -> f64 {
        let (num, den) = self.lift_ratio();
        round_ratio(num, den)
    }

    /// Flatten into the record handed to the result sink.
    pub fn to_record(&self) -> RuleRecord {
        RuleRecord {
            antecedent: self.antecedent.items().to_vec(),
            consequent: self.consequent.items().to_vec(),
            support: self.support(),
            confidence: self.confidence(),
            lift: self.lift(),
        }
    }

    fn lift_ratio(&self) -> (u128, u128) {
        (
            self.itemset_count as u128 * self.transaction_count as u128,
            self.antecedent_count as u128 * self.consequent_count as u128,
        )
    }

    /// Ranking order: confidence desc, support desc, then antecedent and
    /// consequent labels ascending.
    fn rank(&self, other: &Self) -> Ordering {
        let confidence = (other.itemset_count as u128 * self.antecedent_count as u128)
            .cmp(&(self.itemset_count as u128 * other.antecedent_count as u128));
        confidence
            .then_with(|| other.itemset_count.cmp(&self.itemset_count))
            .then_with(|| self.antecedent.cmp(&other.antecedent))
            .then_with(|| self.consequent.cmp(&other.consequent))
    }
}

/// Serializable rule with metrics as 3 dp fractions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleRecord {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

/// Derives ranked rules from frequent itemsets.
#[derive(Debug, Clone, Copy)]
pub struct RuleGenerator {
    min_confidence: f64,
    min_lift: f64,
}

impl RuleGenerator {
    pub fn new(min_confidence: f64, min_lift: f64) -> Self {
        Self {
            min_confidence,
            min_lift,
        }
    }

    pub fn from_config(config: &MiningConfig) -> Self {
        Self::new(config.min_confidence, config.min_lift)
    }

    /// Enumerate every antecedent/consequent split of each frequent itemset of
    /// size >= 2, keep those meeting both thresholds and rank them.
    pub(crate) fn generate(&self, frequent: &FrequentLevels) -> MiningResult<Vec<AssociationRule>> {
        let counts: HashMap<&[ItemId], u64> = frequent
            .levels
            .iter()
            .flatten()
            .map(|counted| (counted.ids.as_slice(), counted.count))
            .collect();

        let mut seen: HashSet<(Vec<ItemId>, Vec<ItemId>)> = HashSet::new();
        let mut rules = Vec::new();

        for counted in frequent.levels.iter().skip(1).flatten() {
            let size = counted.ids.len();
            if size >= u64::BITS as usize {
                return Err(MiningError::resource_exceeded(format!(
                    "itemset of size {size} is too large to enumerate rules for"
                )));
            }

            for mask in 1..(1u64 << size) - 1 {
                let (antecedent, consequent) = split(&counted.ids, mask);
                // Downward closure guarantees both halves were counted
                let (Some(&antecedent_count), Some(&consequent_count)) = (
                    counts.get(antecedent.as_slice()),
                    counts.get(consequent.as_slice()),
                ) else {
                    continue;
                };

                if !self.accepts(
                    counted.count,
                    antecedent_count,
                    consequent_count,
                    frequent.transaction_count,
                ) {
                    continue;
                }
                if !seen.insert((antecedent.clone(), consequent.clone())) {
                    continue;
                }

                rules.push(AssociationRule {
                    antecedent: frequent.catalog.decode(&antecedent),
                    consequent: frequent.catalog.decode(&consequent),
                    itemset_count: counted.count,
                    antecedent_count,
                    consequent_count,
                    transaction_count: frequent.transaction_count,
                });
            }
        }

        rules.sort_by(AssociationRule::rank);
        debug!(rules = rules.len(), "generated rules");
        Ok(rules)
    }

    fn accepts(
        &self,
        itemset_count: u64,
        antecedent_count: u64,
        consequent_count: u64,
        transaction_count: usize,
    ) -> bool {
        if itemset_count == 0 || antecedent_count == 0 || consequent_count == 0 {
            return false;
        }
        let confidence = itemset_count as f64 / antecedent_count as f64;
        let lift = (itemset_count as u128 * transaction_count as u128) as f64
            / (antecedent_count as u128 * consequent_count as u128) as f64;
        confidence >= self.min_confidence && lift >= self.min_lift
    }
}

/// Split `ids` into the members selected by `mask` and the rest.
fn split(ids: &[ItemId], mask: u64) -> (Vec<ItemId>, Vec<ItemId>) {
    let mut selected = Vec::new();
    let mut rest = Vec::new();
    for (bit, &id) in ids.iter().enumerate() {
        if mask & (1 << bit) != 0 {
            selected.push(id);
        } else {
            rest.push(id);
        }
    }
    (selected, rest)
}

/// Round `num / den` to 3 decimal places, ties to even, without floating point.
pub(crate) fn round_ratio(num: u128, den: u128) -> f64 {
    if den == 0 {
        return 0.0;
    }
    let scaled = num * METRIC_SCALE;
    let quotient = scaled / den;
    let twice_remainder = 2 * (scaled % den);
    let rounded = match twice_remainder.cmp(&den) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal if quotient % 2 == 0 => quotient,
        Ordering::Equal => quotient + 1,
    };
    rounded as f64 / METRIC_SCALE as f64
}
