//! Grouping raw (transaction, item) rows into per-transaction baskets

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{MiningError, MiningResult};

/// One raw observation: an item bought in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    pub transaction_id: String,
    pub item_label: String,
    /// Date of the transaction, used only when a [`DateWindow`] is set
    pub date: Option<NaiveDate>,
}

impl TransactionRow {
    pub fn new(transaction_id: impl Into<String>, item_label: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            item_label: item_label.into(),
            date: None,
        }
    }

    pub fn dated(
        transaction_id: impl Into<String>,
        item_label: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            date: Some(date),
            ..Self::new(transaction_id, item_label)
        }
    }
}

/// Inclusive range of transaction dates to mine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> MiningResult<Self> {
        if start > end {
            return Err(MiningError::config(format!(
                "date window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The distinct items bought in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub items: BTreeSet<String>,
}

impl Transaction {
    pub fn new<I, S>(id: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

/// The mining population. Its length is the support denominator N.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baskets {
    transactions: Vec<Transaction>,
}

impl Baskets {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Number of transactions entering the miner (N).
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Builds [`Baskets`] from raw rows.
#[derive(Debug, Clone, Default)]
pub struct BasketBuilder {
    drop_singletons: bool,
    window: Option<DateWindow>,
}

impl BasketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop transactions with fewer than two distinct items before N is fixed.
    pub fn drop_singletons(mut self, drop: bool) -> Self {
        self.drop_singletons = drop;
        self
    }

    /// Keep only transactions whose date falls inside `window`.
    pub fn window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Group rows by transaction id, preserving first-seen transaction order.
    ///
    /// # Arguments
    /// * `rows` - Raw observations in any order; a transaction may be split
    ///   across non-contiguous rows
    ///
    /// # Returns
    /// * `Baskets` holding one deduplicated item set per surviving transaction
    pub fn build<I>(&self, rows: I) -> MiningResult<Baskets>
    where
        I: IntoIterator<Item = TransactionRow>,
    {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(Transaction, Option<NaiveDate>)> = Vec::new();
        let mut row_count = 0usize;

        for (row_index, row) in rows.into_iter().enumerate() {
            row_count += 1;
            if row.transaction_id.trim().is_empty() {
                return Err(MiningError::ingest(row_index, "empty transaction_id"));
            }
            if row.item_label.trim().is_empty() {
                return Err(MiningError::ingest(row_index, "empty item_label"));
            }

            let slot = match slots.get(&row.transaction_id) {
                Some(&slot) => slot,
                None => {
                    let slot = groups.len();
                    slots.insert(row.transaction_id.clone(), slot);
                    groups.push((
                        Transaction {
                            id: row.transaction_id,
                            items: BTreeSet::new(),
                        },
                        row.date,
                    ));
                    slot
                }
            };
            groups[slot].0.items.insert(row.item_label);
        }

        let grouped = groups.len();
        let transactions: Vec<Transaction> = groups
            .into_iter()
            .filter(|(_, date)| match (&self.window, date) {
                (None, _) => true,
                (Some(window), Some(date)) => window.contains(*date),
                (Some(_), None) => false,
            })
            .map(|(transaction, _)| transaction)
            .filter(|transaction| !self.drop_singletons || transaction.items.len() >= 2)
            .collect();

        debug!(
            rows = row_count,
            transactions = grouped,
            retained = transactions.len(),
            "built baskets"
        );

        Ok(Baskets::new(transactions))
    }
}

/// Build baskets with default options (no filtering).
pub fn build_baskets<I>(rows: I) -> MiningResult<Baskets>
where
    I: IntoIterator<Item = TransactionRow>,
{
    BasketBuilder::new().build(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_groups_non_contiguous_rows_in_first_seen_order() {
        let rows = vec![
            TransactionRow::new("t2", "milk"),
            TransactionRow::new("t1", "bread"),
            TransactionRow::new("t2", "eggs"),
            TransactionRow::new("t1", "milk"),
        ];

        let baskets = build_baskets(rows).unwrap();
        assert_eq!(baskets.transaction_count(), 2);
        assert_eq!(baskets.transactions()[0], Transaction::new("t2", ["eggs", "milk"]));
        assert_eq!(baskets.transactions()[1], Transaction::new("t1", ["bread", "milk"]));
    }

    #[test]
    fn test_repeated_item_is_kept_once() {
        let rows = vec![
            TransactionRow::new("t1", "bread"),
            TransactionRow::new("t1", "bread"),
            TransactionRow::new("t1", "milk"),
        ];

        let baskets = build_baskets(rows).unwrap();
        assert_eq!(baskets.transactions()[0].items.len(), 2);
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let result = build_baskets(vec![
            TransactionRow::new("t1", "bread"),
            TransactionRow::new("", "milk"),
        ]);
        assert_eq!(result, Err(MiningError::ingest(1, "empty transaction_id")));

        let result = build_baskets(vec![TransactionRow::new("t1", " ")]);
        assert_eq!(result, Err(MiningError::ingest(0, "empty item_label")));
    }

    #[test]
    fn test_drop_singletons_shrinks_population() {
        let rows = vec![
            TransactionRow::new("t1", "bread"),
            TransactionRow::new("t2", "bread"),
            TransactionRow::new("t2", "milk"),
        ];

        let baskets = BasketBuilder::new().drop_singletons(true).build(rows).unwrap();
        assert_eq!(baskets.transaction_count(), 1);
        assert_eq!(baskets.transactions()[0].id, "t2");
    }

    #[test]
    fn test_date_window_uses_first_seen_date() {
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let rows = vec![
            TransactionRow::dated("t1", "bread", date(2024, 1, 5)),
            TransactionRow::dated("t2", "milk", date(2024, 2, 1)),
            TransactionRow::new("t3", "eggs"),
            TransactionRow::dated("t1", "milk", date(2024, 3, 1)),
            TransactionRow::dated("t4", "eggs", date(2024, 1, 31)),
        ];

        let baskets = BasketBuilder::new().window(window).build(rows).unwrap();
        let ids: Vec<&str> = baskets.transactions().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t4"]);
        assert_eq!(baskets.transactions()[0].items.len(), 2);
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        assert!(DateWindow::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());
        assert!(DateWindow::new(date(2024, 1, 1), date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_no_rows_gives_empty_population() {
        let baskets = build_baskets(Vec::new()).unwrap();
        assert!(baskets.is_empty());
        assert_eq!(baskets.transaction_count(), 0);
    }
}
