use std::collections::HashMap;
use std::num::ParseFloatError;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::config::ProviderCredential;
use crate::error::{AppError, Result};
use crate::models::{BalanceReport, CompanyOverview, IncomeReport, Quote, StockBar};
use crate::services::api_client::{ApiClient, ApiRequest};
use crate::services::context::CallContext;
use crate::services::providers::{FundamentalsProvider, QuoteProvider};

pub const BASE_URL: &str = "https://www.alphavantage.co";

const SERIES_INTERVAL: &str = "5min";

pub struct AlphaVantageClient {
    api: ApiClient,
}

impl AlphaVantageClient {
    pub fn new(credential: ProviderCredential, timeout: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, credential, timeout)
    }

    pub fn with_base_url(base_url: &str, credential: ProviderCredential, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, credential, timeout)?,
        })
    }

    fn query(&self, function: &str, symbol: &str) -> ApiRequest {
        ApiRequest::get("/query")
            .query("function", function)
            .query("symbol", symbol)
            .query("apikey", self.api.api_key())
    }
}

// ---------------- Numeric fields ----------------

/// Parse a numeric string field, surfacing the raw parse error.
pub fn parse_number(raw: &str) -> std::result::Result<f64, ParseFloatError> {
    raw.trim().trim_end_matches('%').parse::<f64>()
}

/// Parse a numeric string field into an explicit "no value" on absence or
/// garbage. `"0"` stays `Some(0.0)`.
pub fn parse_optional(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") || raw == "-" {
        return None;
    }
    parse_number(raw).ok().filter(|v| v.is_finite())
}

/// Like `parse_number` but names the offending field.
pub fn parse_field(field: &str, raw: &str) -> Result<f64> {
    parse_number(raw).map_err(|e| AppError::Decode(format!("field {field} = {raw:?}: {e}")))
}

fn opt_str(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
}

/// Alpha Vantage answers throttling and bad symbols with HTTP 200 and one of
/// these keys instead of the payload.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderNotice {
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
}

impl ProviderNotice {
    fn into_error(self, what: &str, symbol: &str) -> AppError {
        let msg = self
            .error_message
            .or(self.note)
            .or(self.information)
            .unwrap_or_else(|| "empty payload".to_string());
        AppError::Decode(format!("no {what} for {symbol}: {msg}"))
    }
}

// ---------------- Quote ----------------

#[derive(Debug, Default, Deserialize)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "02. open")]
    pub open: Option<String>,
    #[serde(rename = "03. high")]
    pub high: Option<String>,
    #[serde(rename = "04. low")]
    pub low: Option<String>,
    #[serde(rename = "05. price")]
    pub price: Option<String>,
    #[serde(rename = "06. volume")]
    pub volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    pub latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    pub previous_close: Option<String>,
    #[serde(rename = "09. change")]
    pub change: Option<String>,
    #[serde(rename = "10. change percent")]
    pub change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    #[serde(rename = "Global Quote")]
    pub global_quote: Option<GlobalQuote>,
    #[serde(flatten)]
    pub notice: ProviderNotice,
}

pub fn normalize_quote(symbol: &str, resp: QuoteResponse) -> Result<Quote> {
    let q = match resp.global_quote {
        Some(q) if q.symbol.is_some() => q,
        _ => return Err(resp.notice.into_error("quote", symbol)),
    };

    Ok(Quote {
        symbol: opt_str(q.symbol).unwrap_or_else(|| symbol.to_string()),
        open: parse_optional(q.open.as_deref()),
        high: parse_optional(q.high.as_deref()),
        low: parse_optional(q.low.as_deref()),
        price: parse_optional(q.price.as_deref()),
        volume: parse_optional(q.volume.as_deref()),
        latest_trading_day: q
            .latest_trading_day
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
        previous_close: parse_optional(q.previous_close.as_deref()),
        change: parse_optional(q.change.as_deref()),
        change_percent: parse_optional(q.change_percent.as_deref()),
    })
}

// ---------------- Intraday time series ----------------

#[derive(Debug, Default, Deserialize)]
pub struct SeriesPoint {
    #[serde(rename = "1. open")]
    pub open: Option<String>,
    #[serde(rename = "2. high")]
    pub high: Option<String>,
    #[serde(rename = "3. low")]
    pub low: Option<String>,
    #[serde(rename = "4. close")]
    pub close: Option<String>,
    #[serde(rename = "5. volume")]
    pub volume: Option<String>,
}

/// A series point with each numeric field parsed independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesValues {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl SeriesPoint {
    pub fn values(&self) -> SeriesValues {
        SeriesValues {
            open: parse_optional(self.open.as_deref()),
            high: parse_optional(self.high.as_deref()),
            low: parse_optional(self.low.as_deref()),
            close: parse_optional(self.close.as_deref()),
            volume: parse_optional(self.volume.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SeriesMeta {
    #[serde(rename = "2. Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "6. Time Zone")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesResponse {
    #[serde(rename = "Meta Data")]
    pub meta: Option<SeriesMeta>,
    #[serde(rename = "Time Series (5min)")]
    pub series: Option<HashMap<String, SeriesPoint>>,
    #[serde(flatten)]
    pub notice: ProviderNotice,
}

fn point_to_bar(symbol: &str, tz: Tz, stamp: &str, p: &SeriesPoint) -> Result<StockBar> {
    let local = NaiveDateTime::parse_from_str(stamp.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|e| AppError::Decode(format!("series timestamp {stamp:?}: {e}")))?;
    let timestamp = tz
        .from_local_datetime(&local)
        .earliest()
        .ok_or_else(|| AppError::Decode(format!("series timestamp {stamp:?} does not exist in {tz}")))?
        .with_timezone(&Utc);

    let v = p.values();
    let (Some(open), Some(high), Some(low), Some(close)) = (v.open, v.high, v.low, v.close) else {
        return Err(AppError::Decode(format!("series point {stamp:?} has no usable price")));
    };

    Ok(StockBar {
        symbol: symbol.to_string(),
        timestamp,
        open,
        high,
        low,
        close,
        // missing volume is stored as 0
        volume: v.volume.unwrap_or(0.0),
    })
}

/// Convert the provider's wall-clock keyed series into absolute bars, oldest
/// first. An unparsable volume is treated as missing; points without a
/// usable open, high, low and close are dropped individually.
pub fn normalize_time_series(symbol: &str, resp: TimeSeriesResponse) -> Result<Vec<StockBar>> {
    let Some(series) = resp.series else {
        return Err(resp.notice.into_error("time series", symbol));
    };

    let meta = resp.meta.unwrap_or_default();
    let tz: Tz = meta
        .time_zone
        .as_deref()
        .and_then(|z| z.trim().parse().ok())
        .unwrap_or(chrono_tz::America::New_York);
    let symbol = opt_str(meta.symbol).unwrap_or_else(|| symbol.to_string());

    let mut bars = Vec::with_capacity(series.len());
    for (stamp, point) in &series {
        match point_to_bar(&symbol, tz, stamp, point) {
            Ok(bar) => bars.push(bar),
            Err(e) => tracing::warn!(symbol = %symbol, date = %stamp, error = %e, "skipping series point"),
        }
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

// ---------------- Fundamentals ----------------

#[derive(Debug, Default, Deserialize)]
pub struct OverviewResponse {
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    #[serde(rename = "PEGRatio")]
    pub peg_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio")]
    pub price_to_book: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    pub return_on_equity_ttm: Option<String>,
    #[serde(rename = "OperatingMarginTTM")]
    pub operating_margin: Option<String>,
    #[serde(rename = "ProfitMargin")]
    pub profit_margin: Option<String>,
    #[serde(rename = "DividendYield")]
    pub dividend_yield: Option<String>,
    #[serde(rename = "Beta")]
    pub beta: Option<String>,
    #[serde(flatten)]
    pub notice: ProviderNotice,
}

pub fn normalize_overview(symbol: &str, resp: OverviewResponse) -> Result<CompanyOverview> {
    let Some(sym) = opt_str(resp.symbol) else {
        return Err(resp.notice.into_error("overview", symbol));
    };

    Ok(CompanyOverview {
        symbol: sym,
        name: opt_str(resp.name),
        pe_ratio: parse_optional(resp.pe_ratio.as_deref()),
        peg_ratio: parse_optional(resp.peg_ratio.as_deref()),
        price_to_book: parse_optional(resp.price_to_book.as_deref()),
        return_on_equity_ttm: parse_optional(resp.return_on_equity_ttm.as_deref()),
        operating_margin: parse_optional(resp.operating_margin.as_deref()),
        profit_margin: parse_optional(resp.profit_margin.as_deref()),
        dividend_yield: parse_optional(resp.dividend_yield.as_deref()),
        beta: parse_optional(resp.beta.as_deref()),
    })
}

#[derive(Debug, Deserialize)]
pub struct IncomeRow {
    #[serde(rename = "fiscalDateEnding")]
    pub fiscal_date_ending: String,
    #[serde(rename = "totalRevenue")]
    pub total_revenue: Option<String>,
    #[serde(rename = "netIncome")]
    pub net_income: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncomeStatementResponse {
    #[serde(rename = "annualReports")]
    pub annual_reports: Option<Vec<IncomeRow>>,
    #[serde(flatten)]
    pub notice: ProviderNotice,
}

#[derive(Debug, Deserialize)]
pub struct BalanceRow {
    #[serde(rename = "fiscalDateEnding")]
    pub fiscal_date_ending: String,
    #[serde(rename = "totalShareholderEquity")]
    pub total_shareholder_equity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceSheetResponse {
    #[serde(rename = "annualReports")]
    pub annual_reports: Option<Vec<BalanceRow>>,
    #[serde(flatten)]
    pub notice: ProviderNotice,
}

pub fn normalize_income(symbol: &str, resp: IncomeStatementResponse) -> Result<Vec<IncomeReport>> {
    let Some(rows) = resp.annual_reports else {
        return Err(resp.notice.into_error("income statement", symbol));
    };

    let mut reports: Vec<IncomeReport> = rows
        .into_iter()
        .map(|r| IncomeReport {
            symbol: symbol.to_string(),
            fiscal_date_ending: r.fiscal_date_ending.trim().to_string(),
            total_revenue: parse_optional(r.total_revenue.as_deref()),
            net_income: parse_optional(r.net_income.as_deref()),
        })
        .collect();
    reports.sort_by(|a, b| b.fiscal_date_ending.cmp(&a.fiscal_date_ending));
    Ok(reports)
}

pub fn normalize_balance(symbol: &str, resp: BalanceSheetResponse) -> Result<Vec<BalanceReport>> {
    let Some(rows) = resp.annual_reports else {
        return Err(resp.notice.into_error("balance sheet", symbol));
    };

    let mut reports: Vec<BalanceReport> = rows
        .into_iter()
        .map(|r| BalanceReport {
            symbol: symbol.to_string(),
            fiscal_date_ending: r.fiscal_date_ending.trim().to_string(),
            total_shareholder_equity: parse_optional(r.total_shareholder_equity.as_deref()),
        })
        .collect();
    reports.sort_by(|a, b| b.fiscal_date_ending.cmp(&a.fiscal_date_ending));
    Ok(reports)
}

// ---------------- Adapter ----------------

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn fetch_quote(&self, ctx: &CallContext, symbol: &str) -> Result<Quote> {
        tracing::info!(symbol, "fetching stock quote");
        let resp: QuoteResponse = self.api.execute_json(ctx, &self.query("GLOBAL_QUOTE", symbol)).await?;
        normalize_quote(symbol, resp)
    }

    async fn fetch_time_series(&self, ctx: &CallContext, symbol: &str) -> Result<Vec<StockBar>> {
        tracing::info!(symbol, "fetching intraday time series");
        let req = self
            .query("TIME_SERIES_INTRADAY", symbol)
            .query("interval", SERIES_INTERVAL);
        let resp: TimeSeriesResponse = self.api.execute_json(ctx, &req).await?;
        let bars = normalize_time_series(symbol, resp)?;
        tracing::info!(symbol, count = bars.len(), "fetched intraday time series");
        Ok(bars)
    }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageClient {
    async fn fetch_overview(&self, ctx: &CallContext, symbol: &str) -> Result<CompanyOverview> {
        let resp: OverviewResponse = self.api.execute_json(ctx, &self.query("OVERVIEW", symbol)).await?;
        normalize_overview(symbol, resp)
    }

    async fn fetch_income_statement(&self, ctx: &CallContext, symbol: &str) -> Result<Vec<IncomeReport>> {
        let resp: IncomeStatementResponse = self
            .api
            .execute_json(ctx, &self.query("INCOME_STATEMENT", symbol))
            .await?;
        normalize_income(symbol, resp)
    }

    async fn fetch_balance_sheet(&self, ctx: &CallContext, symbol: &str) -> Result<Vec<BalanceReport>> {
        let resp: BalanceSheetResponse = self
            .api
            .execute_json(ctx, &self.query("BALANCE_SHEET", symbol))
            .await?;
        normalize_balance(symbol, resp)
    }
}
