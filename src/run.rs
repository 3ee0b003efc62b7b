//! Mining run orchestration
//!
//! A run moves through `Init -> BuildingBaskets -> MiningItemsets(k) ->
//! GeneratingRules -> Complete`, or stops in `Failed`. It either completes
//! with a (possibly empty) ranked rule list or fails with no rules at all.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::basket::{BasketBuilder, Baskets, TransactionRow};
use crate::config::MiningConfig;
use crate::error::{MiningError, MiningResult};
use crate::itemset::FrequentItemset;
use crate::miner::{ItemsetMiner, LevelSummary};
use crate::rules::{AssociationRule, RuleGenerator, RuleRecord};

/// Cooperative cancellation flag shared between a run and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the run stops at its next level boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Where a [`MiningRun`] is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Init,
    BuildingBaskets,
    /// Counting candidates of size `level`
    MiningItemsets { level: usize },
    GeneratingRules,
    Complete,
    Failed(MiningError),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => write!(f, "init"),
            RunState::BuildingBaskets => write!(f, "building baskets"),
            RunState::MiningItemsets { level } => write!(f, "mining itemsets (k={level})"),
            RunState::GeneratingRules => write!(f, "generating rules"),
            RunState::Complete => write!(f, "complete"),
            RunState::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningReport {
    /// Support denominator N
    pub transaction_count: usize,
    /// Every frequent itemset, by size then label order
    pub frequent_itemsets: Vec<FrequentItemset>,
    /// Ranked rules
    pub rules: Vec<AssociationRule>,
    pub levels: Vec<LevelSummary>,
}

impl MiningReport {
    fn empty() -> Self {
        Self {
            transaction_count: 0,
            frequent_itemsets: Vec::new(),
            rules: Vec::new(),
            levels: Vec::new(),
        }
    }

    /// True when no transactions entered the miner.
    pub fn is_empty_dataset(&self) -> bool {
        self.transaction_count == 0
    }

    /// Rules in rank order as sink records.
    pub fn records(&self) -> Vec<RuleRecord> {
        self.rules.iter().map(AssociationRule::to_record).collect()
    }
}

/// A single mining run over one transaction window.
#[derive(Debug)]
pub struct MiningRun {
    config: MiningConfig,
    builder: BasketBuilder,
    cancel: CancellationToken,
    state: RunState,
}

impl MiningRun {
    /// Create a run in `Init`. The config is checked when the run starts.
    pub fn new(config: MiningConfig) -> Self {
        Self {
            config,
            builder: BasketBuilder::new(),
            cancel: CancellationToken::new(),
            state: RunState::Init,
        }
    }

    /// Use `builder` for grouping and filtering rows.
    pub fn with_basket_builder(mut self, builder: BasketBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Validate the config; an invalid one moves the run to `Failed`.
    ///
    /// `execute` and `mine` call this before reading any basket, so callers
    /// only need it to fail fast before loading their input.
    pub fn check_config(&mut self) -> MiningResult<()> {
        match self.config.validate() {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Build baskets from `rows`, mine them and rank the rules.
    #[instrument(skip_all)]
    pub fn execute<I>(&mut self, rows: I) -> MiningResult<MiningReport>
    where
        I: IntoIterator<Item = TransactionRow>,
    {
        self.check_config()?;
        self.transition(RunState::BuildingBaskets);
        let baskets = match self.builder.build(rows) {
            Ok(baskets) => baskets,
            Err(err) => return Err(self.fail(err)),
        };
        self.run_mining(&baskets)
    }

    /// Mine baskets that were already built.
    #[instrument(skip_all, fields(transactions = baskets.transaction_count()))]
    pub fn mine(&mut self, baskets: &Baskets) -> MiningResult<MiningReport> {
        self.check_config()?;
        self.run_mining(baskets)
    }

    fn run_mining(&mut self, baskets: &Baskets) -> MiningResult<MiningReport> {
        if baskets.is_empty() {
            info!("no transactions to mine");
            self.transition(RunState::Complete);
            return Ok(MiningReport::empty());
        }

        let mut levels = Vec::new();
        let mined = {
            let config = &self.config;
            let cancel = &self.cancel;
            let state = &mut self.state;
            ItemsetMiner::new(config)
                .with_cancellation(cancel)
                .mine_levels(baskets, |summary| {
                    *state = RunState::MiningItemsets {
                        level: summary.level,
                    };
                    levels.push(*summary);
                })
        };
        let frequent = match mined {
            Ok(frequent) => frequent,
            Err(err) => return Err(self.fail(err)),
        };

        if self.cancel.is_cancelled() {
            return Err(self.fail(MiningError::Cancelled));
        }

        self.transition(RunState::GeneratingRules);
        let rules = match RuleGenerator::from_config(&self.config).generate(&frequent) {
            Ok(rules) => rules,
            Err(err) => return Err(self.fail(err)),
        };

        let report = MiningReport {
            transaction_count: baskets.transaction_count(),
            frequent_itemsets: frequent.itemsets(),
            rules,
            levels,
        };
        info!(
            transactions = report.transaction_count,
            itemsets = report.frequent_itemsets.len(),
            rules = report.rules.len(),
            "mining complete"
        );
        self.transition(RunState::Complete);
        Ok(report)
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "run state");
        self.state = next;
    }

    fn fail(&mut self, err: MiningError) -> MiningError {
        warn!(error = %err, "mining run failed");
        self.state = RunState::Failed(err.clone());
        err
    }
}

/// Mine `baskets` with `config` and return the ranked rules and N.
///
/// The config is validated before any basket is read. An empty basket
/// collection completes with no rules.
pub fn mine(baskets: &Baskets, config: &MiningConfig) -> MiningResult<MiningReport> {
    MiningRun::new(config.clone()).mine(baskets)
}
