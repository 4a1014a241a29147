mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use common::*;
use stockharvest::routes;
use stockharvest::services::{memory_store::MemoryStore, store::StockStore};

fn compute(symbol: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/scorecard")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "symbol": symbol }).to_string()))
        .unwrap()
}

fn app(store: Arc<MemoryStore>) -> axum::Router {
    routes::app(test_state(Arc::new(FakeMarket::default()), store))
}

#[tokio::test]
async fn compute_without_fundamentals_is_500() {
    let res = app(Arc::new(MemoryStore::new())).oneshot(compute("AAPL")).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(res).await;
    assert!(body["message"].as_str().unwrap().contains("missing overview"));
}

#[tokio::test]
async fn compute_then_fetch() {
    let store = Arc::new(MemoryStore::new());
    store.upsert_overview(&overview("AAPL")).await.unwrap();
    store
        .upsert_income_reports(&[income("AAPL", 2023, 383.0, 97.0), income("AAPL", 2022, 394.0, 99.8)])
        .await
        .unwrap();
    store
        .upsert_balance_reports(&[balance("AAPL", 2023, 62.0), balance("AAPL", 2022, 0.0)])
        .await
        .unwrap();
    let app = app(store);

    let res = app.clone().oneshot(compute("AAPL")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["revenue_5y_growth"], 0.0);
    assert!(body["historical_roe"]["2023"].is_number());
    assert!(body["historical_roe"].get("2022").is_none());

    let req = Request::builder()
        .uri("/api/scorecard?symbol=AAPL")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["pe_ratio"], 28.5);
}

#[tokio::test]
async fn fetch_before_compute_is_404() {
    let req = Request::builder()
        .uri("/api/scorecard?symbol=AAPL")
        .body(Body::empty())
        .unwrap();
    let res = app(Arc::new(MemoryStore::new())).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn compute_requires_symbol() {
    let res = app(Arc::new(MemoryStore::new())).oneshot(compute("  ")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
