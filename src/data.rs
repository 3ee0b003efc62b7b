//! Loading transaction rows from CSV using Polars

use chrono::NaiveDate;
use polars::prelude::*;

use crate::basket::TransactionRow;

/// Names of the CSV columns holding each row field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub transaction_id: String,
    pub item_label: String,
    /// Optional transaction date column (`YYYY-MM-DD`, time part ignored)
    pub date: Option<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            transaction_id: "transaction_id".to_string(),
            item_label: "item_label".to_string(),
            date: None,
        }
    }
}

/// Load one `TransactionRow` per CSV record
///
/// # Arguments
/// * `file_path` - Path to a CSV file with a header row
/// * `columns` - Which columns hold the transaction id, item label and date
///
/// # Returns
/// * Rows in file order; null ids or labels come through as empty strings so
///   the basket builder can reject them with their row position
pub fn load_transaction_rows(
    file_path: &str,
    columns: &ColumnSpec,
) -> crate::Result<Vec<TransactionRow>> {
    // No schema inference: every column is read as text, so ids such as
    // "001" or "C536379" reach the basket builder unchanged
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.into()))?
        .finish()?;

    // Resolve columns first so a mistyped name fails even on a header-only file
    let ids = string_column(&df, &columns.transaction_id)?;
    let items = string_column(&df, &columns.item_label)?;
    let dates = match &columns.date {
        Some(name) => Some(string_column(&df, name)?),
        None => None,
    };

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let date = match dates.as_ref().and_then(|dates| dates.get(i)) {
            Some(raw) => Some(parse_date(raw).map_err(|e| anyhow::anyhow!("row {i}: {e}"))?),
            None => None,
        };
        rows.push(TransactionRow {
            transaction_id: ids.get(i).unwrap_or_default().to_string(),
            item_label: items.get(i).unwrap_or_default().to_string(),
            date,
        });
    }

    Ok(rows)
}

/// Parse a `YYYY-MM-DD` date, ignoring any trailing time component
pub fn parse_date(raw: &str) -> crate::Result<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date value: {}", raw))
}

fn string_column(df: &DataFrame, name: &str) -> crate::Result<StringChunked> {
    Ok(df.column(name)?.as_materialized_series().str()?.clone())
}
