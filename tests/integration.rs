//! Integration tests for BasketForge

use basketforge::{
    build_baskets, load_transaction_rows, mine, BasketBuilder, Baskets, ColumnSpec, DateWindow,
    Itemset, MiningConfig, MiningError, MiningRun, RunState, Transaction, TransactionRow,
};
use chrono::NaiveDate;
use std::io::Write;
use tempfile::NamedTempFile;

/// Create a test CSV file with sample invoice lines
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "transaksi_id,nama_barang,tanggal").unwrap();

    // Invoice 1001 - bread and milk, lines split across the file
    writeln!(file, "1001,bread,2024-03-01").unwrap();
    writeln!(file, "1002,bread,2024-03-01").unwrap();
    writeln!(file, "1001,milk,2024-03-01").unwrap();

    // Invoice 1002 - bread, milk and eggs
    writeln!(file, "1002,milk,2024-03-01").unwrap();
    writeln!(file, "1002,eggs,2024-03-01").unwrap();

    // Invoice 1003 - bread only, scanned twice
    writeln!(file, "1003,bread,2024-03-02").unwrap();
    writeln!(file, "1003,bread,2024-03-02").unwrap();

    // Invoice 1004 - milk and eggs
    writeln!(file, "1004,milk,2024-03-03").unwrap();
    writeln!(file, "1004,eggs,2024-03-03").unwrap();

    // Invoice 1005 - outside March
    writeln!(file, "1005,butter,2024-04-10").unwrap();
    writeln!(file, "1005,jam,2024-04-10").unwrap();

    file
}

fn columns() -> ColumnSpec {
    ColumnSpec {
        transaction_id: "transaksi_id".to_string(),
        item_label: "nama_barang".to_string(),
        date: Some("tanggal".to_string()),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn grocery_baskets() -> Baskets {
    Baskets::new(vec![
        Transaction::new("1", ["bread", "milk"]),
        Transaction::new("2", ["bread", "milk", "eggs"]),
        Transaction::new("3", ["bread"]),
        Transaction::new("4", ["milk", "eggs"]),
    ])
}

#[test]
fn test_scenario_a_bread_implies_milk() {
    let report = mine(&grocery_baskets(), &MiningConfig::new(0.5, 0.5, 0.0)).unwrap();
    assert_eq!(report.transaction_count, 4);

    let support_of = |labels: &[&str]| {
        let itemset = Itemset::new(labels.iter().copied());
        report
            .frequent_itemsets
            .iter()
            .find(|f| f.itemset == itemset)
            .map(|f| f.support(report.transaction_count))
    };
    assert_eq!(support_of(&["bread"]), Some(0.75));
    assert_eq!(support_of(&["milk"]), Some(0.75));
    assert_eq!(support_of(&["bread", "milk"]), Some(0.5));
    assert_eq!(support_of(&["bread", "eggs"]), None);

    let records = report.records();
    let rule = records
        .iter()
        .find(|r| r.antecedent == ["bread"] && r.consequent == ["milk"])
        .unwrap();
    assert_eq!(rule.support, 0.5);
    assert_eq!(rule.confidence, 0.667);
    assert_eq!(rule.lift, 0.889);
}

#[test]
fn test_scenario_b_empty_transaction_set() {
    let report = mine(&Baskets::default(), &MiningConfig::new(0.5, 0.5, 0.0)).unwrap();
    assert!(report.is_empty_dataset());
    assert!(report.rules.is_empty());

    let mut run = MiningRun::new(MiningConfig::default());
    let report = run.execute(Vec::new()).unwrap();
    assert!(report.rules.is_empty());
    assert_eq!(run.state(), &RunState::Complete);
}

#[test]
fn test_scenario_c_invalid_support_is_config_error() {
    let config = MiningConfig::new(1.5, 0.5, 0.0);
    assert!(matches!(
        mine(&grocery_baskets(), &config),
        Err(MiningError::Config(_))
    ));

    let mut run = MiningRun::new(config);
    assert!(matches!(run.check_config(), Err(MiningError::Config(_))));
    assert!(matches!(run.state(), RunState::Failed(MiningError::Config(_))));
}

#[test]
fn test_scenario_d_repeated_item_counted_once() {
    let baskets = build_baskets(vec![
        TransactionRow::new("1", "bread"),
        TransactionRow::new("1", "bread"),
        TransactionRow::new("2", "milk"),
    ])
    .unwrap();
    assert_eq!(baskets.transactions()[0].items.len(), 1);

    let report = mine(&baskets, &MiningConfig::new(0.5, 0.0, 0.0)).unwrap();
    let bread = report
        .frequent_itemsets
        .iter()
        .find(|f| f.itemset == Itemset::new(["bread"]))
        .unwrap();
    assert_eq!(bread.count, 1);
}

#[test]
fn test_end_to_end_pipeline() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();

    let rows = load_transaction_rows(file_path, &columns()).unwrap();
    assert_eq!(rows.len(), 11);

    let mut run = MiningRun::new(MiningConfig::new(0.4, 0.5, 0.0));
    let report = run.execute(rows).unwrap();

    // 5 invoices, 1003 holds bread once
    assert_eq!(report.transaction_count, 5);
    assert_eq!(run.state(), &RunState::Complete);

    for rule in &report.rules {
        assert!(rule.confidence() > 0.0 && rule.confidence() <= 1.0);
        assert!(rule.itemset_count <= rule.antecedent_count);
        assert!(rule.itemset_count <= rule.consequent_count);
    }
}

#[test]
fn test_date_window_restricts_population() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();
    let rows = load_transaction_rows(file_path, &columns()).unwrap();

    let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
    let mut run = MiningRun::new(MiningConfig::new(0.5, 0.5, 0.0))
        .with_basket_builder(BasketBuilder::new().window(window));
    let report = run.execute(rows).unwrap();

    // Same population as the grocery example once April is excluded
    let expected = mine(&grocery_baskets(), &MiningConfig::new(0.5, 0.5, 0.0)).unwrap();
    assert_eq!(report.transaction_count, 4);
    assert_eq!(report.records(), expected.records());
}

#[test]
fn test_drop_singletons_changes_denominator() {
    let rows = vec![
        TransactionRow::new("1", "bread"),
        TransactionRow::new("1", "milk"),
        TransactionRow::new("2", "bread"),
    ];
    let mut run = MiningRun::new(MiningConfig::new(0.5, 0.0, 0.0))
        .with_basket_builder(BasketBuilder::new().drop_singletons(true));
    let report = run.execute(rows).unwrap();

    assert_eq!(report.transaction_count, 1);
    assert!(report.rules.iter().all(|rule| rule.support() == 1.0));
}

#[test]
fn test_error_handling_malformed_rows() {
    let mut run = MiningRun::new(MiningConfig::default());
    let result = run.execute(vec![
        TransactionRow::new("1", "bread"),
        TransactionRow::new("1", ""),
    ]);

    assert_eq!(result, Err(MiningError::ingest(1, "empty item_label")));
    assert!(matches!(run.state(), RunState::Failed(MiningError::Ingest { .. })));
}

#[test]
fn test_resource_ceiling_fails_whole_run() {
    // Ten items that always appear together: the lattice has 1023 itemsets
    let items: Vec<String> = (0..10).map(|i| format!("item{i}")).collect();
    let baskets = Baskets::new(vec![
        Transaction::new("1", items.clone()),
        Transaction::new("2", items),
    ]);
    let config = MiningConfig::new(1.0, 0.0, 0.0).with_candidate_ceiling(100);

    assert!(matches!(
        mine(&baskets, &config),
        Err(MiningError::ResourceExceeded(_))
    ));
}
