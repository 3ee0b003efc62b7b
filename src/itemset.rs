//! Itemsets and the canonical item ordering

use std::fmt;

use crate::basket::Baskets;

/// Dense item index. Ids are assigned in lexicographic label order, so sorting
/// ids sorts labels.
pub(crate) type ItemId = u32;

/// Sorted, distinct item labels of the mining population.
#[derive(Debug, Clone, Default)]
pub(crate) struct ItemCatalog {
    labels: Vec<String>,
}

impl ItemCatalog {
    pub(crate) fn from_baskets(baskets: &Baskets) -> Self {
        let mut labels: Vec<String> = baskets
            .transactions()
            .iter()
            .flat_map(|transaction| transaction.items.iter().cloned())
            .collect();
        labels.sort_unstable();
        labels.dedup();
        Self { labels }
    }

    pub(crate) fn len(&self) -> usize {
        self.labels.len()
    }

    pub(crate) fn label(&self, id: ItemId) -> &str {
        &self.labels[id as usize]
    }

    /// Encode every basket as an ascending id list.
    pub(crate) fn encode(&self, baskets: &Baskets) -> Vec<Vec<ItemId>> {
        baskets
            .transactions()
            .iter()
            .map(|transaction| {
                // BTreeSet iteration is already in label order
                transaction
                    .items
                    .iter()
                    .filter_map(|label| self.labels.binary_search(label).ok())
                    .map(|index| index as ItemId)
                    .collect()
            })
            .collect()
    }

    pub(crate) fn decode(&self, ids: &[ItemId]) -> Itemset {
        Itemset {
            items: ids.iter().map(|&id| self.label(id).to_string()).collect(),
        }
    }
}

/// A non-empty set of distinct item labels in canonical (lexicographic) order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Itemset {
    items: Vec<String>,
}

impl Itemset {
    /// Build an itemset from labels in any order; duplicates collapse.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<String> = labels.into_iter().map(Into::into).collect();
        items.sort_unstable();
        items.dedup();
        Self { items }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.items.binary_search_by(|item| item.as_str().cmp(label)).is_ok()
    }

    pub fn is_subset_of(&self, other: &Itemset) -> bool {
        self.items.iter().all(|item| other.contains(item))
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.items.join(", "))
    }
}

/// An itemset that met the minimum support, with its exact transaction count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequentItemset {
    pub itemset: Itemset,
    pub count: u64,
}

impl FrequentItemset {
    /// Support as a fraction of `transaction_count`.
    pub fn support(&self, transaction_count: usize) -> f64 {
        if transaction_count == 0 {
            return 0.0;
        }
        self.count as f64 / transaction_count as f64
    }
}

/// Returns true when every id of `needle` appears in `haystack`; both ascending.
pub(crate) fn is_sorted_subset(needle: &[ItemId], haystack: &[ItemId]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }
    let mut rest = haystack.iter();
    'outer: for id in needle {
        for candidate in rest.by_ref() {
            if candidate == id {
                continue 'outer;
            }
            if candidate > id {
                return false;
            }
        }
        return false;
    }
    true
}
