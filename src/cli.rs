//! Command-line interface definitions and argument parsing

use clap::Parser;

use crate::basket::{BasketBuilder, DateWindow};
use crate::config::MiningConfig;
use crate::data::{parse_date, ColumnSpec};

/// Market basket analysis: frequent itemsets and association rules from transaction rows
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file (one row per item bought)
    #[arg(short, long, default_value = "transactions.csv")]
    pub input: String,

    /// Column holding the transaction id
    #[arg(long, default_value = "transaction_id")]
    pub id_column: String,

    /// Column holding the item label
    #[arg(long, default_value = "item_label")]
    pub item_column: String,

    /// Column holding the transaction date (required with --start-date/--end-date)
    #[arg(long)]
    pub date_column: Option<String>,

    /// First transaction date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last transaction date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Minimum support as a fraction of transactions, in (0, 1]
    #[arg(short = 's', long, default_value = "0.01")]
    pub min_support: f64,

    /// Minimum rule confidence, in [0, 1]
    #[arg(short = 'c', long, default_value = "0.5")]
    pub min_confidence: f64,

    /// Minimum rule lift
    #[arg(short = 'l', long, default_value = "0.0")]
    pub min_lift: f64,

    /// Largest itemset size to mine
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Abort when more candidate itemsets than this are generated
    #[arg(long, default_value = "1000000")]
    pub candidate_ceiling: usize,

    /// Threads used for support counting
    #[arg(long, default_value = "1")]
    pub threads: usize,

    /// Ignore transactions with fewer than two distinct items
    #[arg(long)]
    pub drop_singletons: bool,

    /// Number of top-ranked rules to print
    #[arg(short = 't', long, default_value = "20")]
    pub top: usize,

    /// Write all ranked rules as JSON to this path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Thresholds and limits for the run; validated when the run is created
    pub fn mining_config(&self) -> MiningConfig {
        let mut config = MiningConfig::new(self.min_support, self.min_confidence, self.min_lift)
            .with_candidate_ceiling(self.candidate_ceiling)
            .with_threads(self.threads);
        config.max_itemset_size = self.max_len;
        config
    }

    pub fn column_spec(&self) -> ColumnSpec {
        ColumnSpec {
            transaction_id: self.id_column.clone(),
            item_label: self.item_column.clone(),
            date: self.date_column.clone(),
        }
    }

    /// Parse the date window from `--start-date` and `--end-date`
    pub fn date_window(&self) -> crate::Result<Option<DateWindow>> {
        match (&self.start_date, &self.end_date) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => {
                if self.date_column.is_none() {
                    anyhow::bail!("--start-date/--end-date require --date-column");
                }
                let window = DateWindow::new(parse_date(start)?, parse_date(end)?)?;
                Ok(Some(window))
            }
            _ => anyhow::bail!("--start-date and --end-date must be given together"),
        }
    }

    pub fn basket_builder(&self) -> crate::Result<BasketBuilder> {
        let mut builder = BasketBuilder::new().drop_singletons(self.drop_singletons);
        if let Some(window) = self.date_window()? {
            builder = builder.window(window);
        }
        Ok(builder)
    }
}
