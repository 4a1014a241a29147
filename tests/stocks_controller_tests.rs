mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use common::*;
use stockharvest::models::{StockMetadata, StockSymbol, COMMON_STOCK};
use stockharvest::routes;
use stockharvest::services::{memory_store::MemoryStore, store::StockStore};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn app_with(store: Arc<MemoryStore>) -> axum::Router {
    routes::app(test_state(Arc::new(FakeMarket::default()), store))
}

fn metadata(symbol: &str) -> StockMetadata {
    StockMetadata {
        symbol: symbol.to_string(),
        company_name: Some("Apple Inc".to_string()),
        industry: None,
        exchange: "US".to_string(),
        currency: "USD".to_string(),
        market_cap: None,
        description: "APPLE INC".to_string(),
        website: None,
        kind: COMMON_STOCK.to_string(),
        updated_at: 0,
    }
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = app_with(Arc::new(MemoryStore::new())).await;

    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_json(res).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn latest_price_requires_symbol() {
    let app = app_with(Arc::new(MemoryStore::new())).await;

    let res = app.oneshot(get("/api/stocks")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_json(res).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("symbol"));
}

#[tokio::test]
async fn latest_price_uses_most_recent_close() {
    let store = Arc::new(MemoryStore::new());
    for b in bars("AAPL", 3) {
        store.upsert_bar(&b).await.unwrap();
    }
    let app = app_with(store).await;

    let res = app.oneshot(get("/api/stocks?symbol=AAPL")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_json(res).await;
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["latest_price"], 102.0);
}

#[tokio::test]
async fn latest_price_for_unknown_symbol_is_an_error_envelope() {
    let app = app_with(Arc::new(MemoryStore::new())).await;

    let res = app.oneshot(get("/api/stocks?symbol=NONE")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response_json(res).await["status"], "error");
}

#[tokio::test]
async fn stock_data_returns_bars_in_range_newest_first() {
    let store = Arc::new(MemoryStore::new());
    for b in bars("AAPL", 3) {
        store.upsert_bar(&b).await.unwrap();
    }
    store.upsert_bar(&bar("AAPL", ts(2024, 2, 1, 15, 0), 120.0)).await.unwrap();
    let app = app_with(store).await;

    let res = app
        .oneshot(get("/api/stocks/data?symbol=AAPL&start=2024-01-01&end=2024-01-02"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_json(res).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["start_date"], "2024-01-01");
    assert_eq!(body["end_date"], "2024-01-02");
    assert_eq!(body["data"][0]["close"], 102.0);
    assert_eq!(body["data"][2]["close"], 100.0);
}

#[tokio::test]
async fn stock_data_rejects_bad_dates() {
    let app = app_with(Arc::new(MemoryStore::new())).await;

    let res = app
        .oneshot(get("/api/stocks/data?symbol=AAPL&start=01/02/2024"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stock_data_rejects_inverted_range() {
    let app = app_with(Arc::new(MemoryStore::new())).await;

    let res = app
        .oneshot(get("/api/stocks/data?symbol=AAPL&start=2024-02-01&end=2024-01-01"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metadata_lookup_list_and_delete() {
    let store = Arc::new(MemoryStore::new());
    store.upsert_metadata(&metadata("AAPL")).await.unwrap();
    store.upsert_metadata(&metadata("MSFT")).await.unwrap();
    let app = app_with(store.clone()).await;

    let res = app.clone().oneshot(get("/api/stocks/metadata?symbol=AAPL")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["company_name"], "Apple Inc");
    assert_eq!(body["type"], COMMON_STOCK);
    assert!(body["industry"].is_null());

    let res = app.clone().oneshot(get("/api/stocks/metadata/all")).await.unwrap();
    assert_eq!(response_json(res).await["count"], 2);

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/stocks/metadata?symbol=AAPL")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(store.get_metadata("AAPL").await.unwrap().is_none());

    let res = app.oneshot(get("/api/stocks/metadata?symbol=AAPL")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_symbols_lookup() {
    let store = Arc::new(MemoryStore::new());
    for (i, s) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
        let row = StockSymbol { symbol: s.to_string(), batch_id: (i / 5) as i64 };
        store.upsert_symbol(&row).await.unwrap();
    }
    let app = app_with(store).await;

    let res = app.clone().oneshot(get("/api/stocks/symbols?batch_id=0")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["count"], 5);

    let res = app.clone().oneshot(get("/api/stocks/symbols?batch_id=1")).await.unwrap();
    assert_eq!(response_json(res).await["symbols"][0], "F");

    let res = app.oneshot(get("/api/stocks/symbols?batch_id=x")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = app_with(Arc::new(MemoryStore::new())).await;

    let res = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(res).await["status"], "error");
}

#[tokio::test]
async fn wrong_method_is_json_405() {
    let app = app_with(Arc::new(MemoryStore::new())).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/stocks?symbol=AAPL")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = response_json(res).await;
    assert!(body["message"].as_str().unwrap().contains("POST"));
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn store_metadata_upserts_posted_row() {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone()).await;

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/stocks/metadata/store",
            json!({ "symbol": "AAPL", "company_name": "Apple Inc", "exchange": "US",
                    "currency": "USD", "description": "APPLE INC", "type": "Common Stock" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["status"], "success");

    let stored = store.get_metadata("AAPL").await.unwrap().unwrap();
    assert_eq!(stored.company_name.as_deref(), Some("Apple Inc"));
    assert!(stored.is_common_stock());
    assert!(stored.updated_at > 0);

    let res = app
        .oneshot(post_json(
            "/api/stocks/metadata/store",
            json!({ "symbol": "AAPL", "company_name": "Apple", "exchange": "US", "currency": "USD" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(store.list_metadata().await.unwrap().len(), 1);
    assert_eq!(store.get_metadata("AAPL").await.unwrap().unwrap().company_name.as_deref(), Some("Apple"));
}

#[tokio::test]
async fn store_metadata_requires_symbol() {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone()).await;

    let res = app
        .clone()
        .oneshot(post_json("/api/stocks/metadata/store", json!({ "company_name": "Nameless" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(post_json("/api/stocks/metadata/store", json!({ "symbol": "   " })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(store.list_metadata().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_metadata_under_its_own_path() {
    let store = Arc::new(MemoryStore::new());
    store.upsert_metadata(&metadata("MSFT")).await.unwrap();
    let app = app_with(store.clone()).await;

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/stocks/metadata/delete?symbol=MSFT")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(store.get_metadata("MSFT").await.unwrap().is_none());
}
