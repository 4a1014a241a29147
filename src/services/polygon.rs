use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::ProviderCredential;
use crate::error::{AppError, Result};
use crate::models::StockBar;
use crate::services::api_client::{ApiClient, ApiRequest};
use crate::services::context::CallContext;
use crate::services::providers::{BarProvider, IntradayBars};

pub const BASE_URL: &str = "https://api.polygon.io/v2";

/// Bar width requested from the aggregates endpoint.
pub const INTERVAL_MINUTES: u32 = 5;

/// Page size ceiling of the aggregates endpoint. Only the first page is read.
pub const PAGE_LIMIT: u32 = 50_000;

pub struct PolygonClient {
    api: ApiClient,
}

impl PolygonClient {
    pub fn new(credential: ProviderCredential, timeout: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, credential, timeout)
    }

    pub fn with_base_url(base_url: &str, credential: ProviderCredential, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, credential, timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AggBar {
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    // epoch milliseconds
    #[serde(rename = "t")]
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
pub struct AggResponse {
    #[serde(default)]
    pub ticker: String,
    #[serde(rename = "resultsCount", default)]
    pub results_count: i64,
    #[serde(default)]
    pub results: Vec<AggBar>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub next_url: Option<String>,
}

/// Map an aggregates payload to bars for `symbol`, oldest first.
pub fn normalize_aggregates(symbol: &str, resp: AggResponse) -> Result<Vec<StockBar>> {
    let mut bars = Vec::with_capacity(resp.results.len());
    for agg in resp.results {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(agg.timestamp)
            .ok_or_else(|| AppError::Decode(format!("bar timestamp out of range: {}", agg.timestamp)))?;

        bars.push(StockBar {
            symbol: symbol.to_string(),
            timestamp,
            open: agg.open,
            high: agg.high,
            low: agg.low,
            close: agg.close,
            volume: agg.volume,
        });
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

#[async_trait]
impl BarProvider for PolygonClient {
    async fn fetch_intraday_bars(
        &self,
        ctx: &CallContext,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<IntradayBars> {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };

        let path = format!(
            "/aggs/ticker/{}/range/{}/minute/{}/{}",
            symbol,
            INTERVAL_MINUTES,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        );
        let req = ApiRequest::get(path)
            .query("adjusted", "true")
            .query("sort", "asc")
            .query("limit", PAGE_LIMIT.to_string())
            .query("apiKey", self.api.api_key());

        let resp: AggResponse = self.api.execute_json(ctx, &req).await?;

        if resp.next_url.is_some() {
            tracing::warn!(symbol, "more bars available than one page, only the first page is stored");
        }

        let canonical = if resp.ticker.trim().is_empty() {
            symbol.to_string()
        } else {
            resp.ticker.clone()
        };

        let bars = normalize_aggregates(&canonical, resp)?;
        tracing::info!(symbol = %canonical, count = bars.len(), "fetched intraday bars");

        Ok(IntradayBars {
            symbol: canonical,
            bars,
        })
    }
}
