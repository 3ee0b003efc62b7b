//! BasketForge: market basket analysis CLI
//!
//! This is the main entrypoint that orchestrates data loading, itemset mining,
//! rule ranking, and handing the rules to a JSON file.

use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

use anyhow::{Context, Result};
use basketforge::{
    load_transaction_rows, Args, LevelSummary, MiningReport, MiningRun, RuleRecord,
};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Document written by `--output`
#[derive(Serialize)]
struct RuleFile {
    transaction_count: usize,
    levels: Vec<LevelSummary>,
    rules: Vec<RuleRecord>,
}

impl RuleFile {
    fn from_report(report: &MiningReport) -> Self {
        Self {
            transaction_count: report.transaction_count,
            levels: report.levels.clone(),
            rules: report.records(),
        }
    }
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        println!("BasketForge - Market Basket Analysis using Apriori");
        println!("==================================================\n");
    }

    run_pipeline(&args)
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the full mining pipeline
fn run_pipeline(args: &Args) -> Result<()> {
    println!("=== Market Basket Analysis ===\n");

    let start_time = Instant::now();

    // Step 1: Check thresholds and window before touching the input
    let builder = args.basket_builder()?;
    let mut run = MiningRun::new(args.mining_config()).with_basket_builder(builder);
    run.check_config()?;

    // Step 2: Load transaction rows
    if args.verbose {
        println!("Step 1: Loading transaction rows");
        println!("  Input file: {}", args.input);
    }
    let rows = load_transaction_rows(&args.input, &args.column_spec())
        .with_context(|| format!("failed to load {}", args.input))?;
    println!("✓ Data loaded: {} rows", rows.len());

    // Step 3: Mine itemsets and rules
    if args.verbose {
        println!("\nStep 2: Mining frequent itemsets");
        println!("  Min support: {}", args.min_support);
        println!("  Min confidence: {}", args.min_confidence);
        println!("  Min lift: {}", args.min_lift);
    }
    let mine_start = Instant::now();
    let report = run.execute(rows)?;
    let mine_time = mine_start.elapsed();

    if report.is_empty_dataset() {
        println!("\nNo transactions to analyse; no rules found.");
        return Ok(());
    }

    println!("✓ Transactions mined: {}", report.transaction_count);
    if args.verbose {
        println!("  Mining time: {:.2}s", mine_time.as_secs_f64());
    }

    print_level_statistics(&report);
    print_top_rules(&report, args.top);

    // Step 4: Hand the ranked rules to the output file
    if let Some(path) = &args.output {
        write_rule_file(path, &report)?;
        println!("\nRules saved to: {}", path);
    }

    let total_time = start_time.elapsed();
    println!("\n=== Analysis Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn print_level_statistics(report: &MiningReport) {
    println!("\n=== Itemset Search ===");
    for level in &report.levels {
        println!(
            "Size {}: {} candidates, {} frequent",
            level.level, level.candidates, level.frequent
        );
    }
    println!("Frequent itemsets: {}", report.frequent_itemsets.len());
}

fn print_top_rules(report: &MiningReport, top: usize) {
    println!("\n=== Top Rules ({} total) ===", report.rules.len());
    if report.rules.is_empty() {
        println!("No rules met the confidence and lift thresholds.");
        return;
    }
    for (rank, rule) in report.rules.iter().take(top).enumerate() {
        println!(
            "{:>3}. {} -> {} (Support: {:.3}, Confidence: {:.3}, Lift: {:.3})",
            rank + 1,
            rule.antecedent,
            rule.consequent,
            rule.support(),
            rule.confidence(),
            rule.lift()
        );
    }
}

fn write_rule_file(path: &str, report: &MiningReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    let document = RuleFile::from_report(report);
    serde_json::to_writer_pretty(BufWriter::new(file), &document)?;
    Ok(())
}
