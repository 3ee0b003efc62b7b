//! BasketForge: A Rust CLI application for market basket analysis
//!
//! This library finds itemsets that are frequently bought together in retail
//! transactions and derives association rules ranked by confidence, support
//! and lift, using a level-wise Apriori search with exact support counts.

pub mod basket;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod itemset;
pub mod miner;
pub mod rules;
pub mod run;

// Re-export public items for easier access
pub use basket::{build_baskets, BasketBuilder, Baskets, DateWindow, Transaction, TransactionRow};
pub use cli::Args;
pub use config::MiningConfig;
pub use data::{load_transaction_rows, ColumnSpec};
pub use error::{MiningError, MiningResult};
pub use itemset::{FrequentItemset, Itemset};
pub use miner::{ItemsetMiner, LevelSummary};
pub use rules::{AssociationRule, RuleGenerator, RuleRecord};
pub use run::{mine, CancellationToken, MiningReport, MiningRun, RunState};

/// Common result type used by the CLI and loaders
pub type Result<T> = anyhow::Result<T>;
