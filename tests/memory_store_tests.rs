mod common;

use common::*;
use stockharvest::models::{StockMetadata, StockSymbol};
use stockharvest::services::{memory_store::MemoryStore, store::StockStore};

#[tokio::test]
async fn upserting_a_bar_twice_keeps_one_row_with_latest_values() {
    let store = MemoryStore::new();
    let at = ts(2024, 1, 2, 14, 30);

    store.upsert_bar(&bar("AAPL", at, 100.0)).await.unwrap();
    let mut second = bar("AAPL", at, 105.0);
    second.volume = 9_999.0;
    store.upsert_bar(&second).await.unwrap();

    assert_eq!(store.bar_count("AAPL").await, 1);
    let stored = store.latest_bar("AAPL").await.unwrap().unwrap();
    assert_eq!(stored, second);
}

#[tokio::test]
async fn bars_between_is_inclusive_and_newest_first() {
    let store = MemoryStore::new();
    for b in bars("AAPL", 5) {
        store.upsert_bar(&b).await.unwrap();
    }

    let got = store
        .bars_between("AAPL", ts(2024, 1, 2, 14, 35), ts(2024, 1, 2, 14, 45))
        .await
        .unwrap();
    let closes: Vec<f64> = got.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![103.0, 102.0, 101.0]);

    let none = store
        .bars_between("AAPL", ts(2024, 1, 3, 0, 0), ts(2024, 1, 2, 0, 0))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn statements_are_keyed_by_fiscal_date() {
    let store = MemoryStore::new();
    store
        .upsert_income_reports(&[income("X", 2021, 10.0, 1.0), income("X", 2023, 30.0, 3.0)])
        .await
        .unwrap();
    store
        .upsert_income_reports(&[income("X", 2023, 31.0, 3.5), income("X", 2022, 20.0, 2.0)])
        .await
        .unwrap();

    let reports = store.income_reports("X").await.unwrap();
    let dates: Vec<&str> = reports.iter().map(|r| r.fiscal_date_ending.as_str()).collect();
    assert_eq!(dates, vec!["2023-09-30", "2022-09-30", "2021-09-30"]);
    assert_eq!(reports[0].total_revenue, Some(31.0));
}

#[tokio::test]
async fn symbol_batch_id_is_replaced_on_upsert() {
    let store = MemoryStore::new();
    store
        .upsert_symbol(&StockSymbol { symbol: "AAPL".into(), batch_id: 0 })
        .await
        .unwrap();
    store
        .upsert_symbol(&StockSymbol { symbol: "AAPL".into(), batch_id: 3 })
        .await
        .unwrap();

    assert!(store.symbols_in_batch(0).await.unwrap().is_empty());
    assert_eq!(store.symbols_in_batch(3).await.unwrap(), vec!["AAPL"]);
    assert_eq!(store.symbols().await.len(), 1);
}

#[tokio::test]
async fn metadata_is_stored_as_given() {
    let store = MemoryStore::new();
    let row = StockMetadata {
        symbol: "AAPL".into(),
        company_name: None,
        industry: None,
        exchange: "US".into(),
        currency: "USD".into(),
        market_cap: None,
        description: "APPLE INC".into(),
        website: None,
        kind: "Common Stock".into(),
        updated_at: 1_700_000_000,
    };

    store.upsert_metadata(&row).await.unwrap();

    assert_eq!(store.get_metadata("AAPL").await.unwrap(), Some(row));
}
