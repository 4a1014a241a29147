#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use http_body_util::BodyExt;

use stockharvest::{
    config,
    error::{AppError, Result},
    models::{
        BalanceReport, CompanyOverview, CompanyProfile, IncomeReport, Quote, Scorecard, StockBar,
        StockMetadata, StockSymbol, SymbolListing,
    },
    services::{
        context::CallContext,
        extraction_service::DataExtractionService,
        memory_store::MemoryStore,
        providers::{BarProvider, FundamentalsProvider, IntradayBars, QuoteProvider, SymbolProvider},
        scorecard_service::ScorecardService,
        store::StockStore,
    },
    AppState,
};

/// Canned provider data. Anything not present answers with a provider 404.
#[derive(Default)]
pub struct FakeMarket {
    pub bars: HashMap<String, Vec<StockBar>>,
    pub series: HashMap<String, Vec<StockBar>>,
    pub quotes: HashMap<String, Quote>,
    pub listings: HashMap<String, Vec<SymbolListing>>,
    pub profiles: HashMap<String, CompanyProfile>,
    pub overviews: HashMap<String, CompanyOverview>,
    pub income: HashMap<String, Vec<IncomeReport>>,
    pub balance: HashMap<String, Vec<BalanceReport>>,
    pub calls: AtomicUsize,
}

fn missing(what: &str, key: &str) -> AppError {
    AppError::ProviderHttp {
        status: 404,
        body: format!("no {what} for {key}"),
    }
}

impl FakeMarket {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuoteProvider for FakeMarket {
    async fn fetch_quote(&self, _ctx: &CallContext, symbol: &str) -> Result<Quote> {
        self.hit();
        self.quotes.get(symbol).cloned().ok_or_else(|| missing("quote", symbol))
    }

    async fn fetch_time_series(&self, _ctx: &CallContext, symbol: &str) -> Result<Vec<StockBar>> {
        self.hit();
        self.series.get(symbol).cloned().ok_or_else(|| missing("series", symbol))
    }
}

#[async_trait]
impl SymbolProvider for FakeMarket {
    async fn fetch_symbols(&self, _ctx: &CallContext, exchange: &str) -> Result<Vec<SymbolListing>> {
        self.hit();
        self.listings.get(exchange).cloned().ok_or_else(|| missing("listing", exchange))
    }

    async fn fetch_company_profile(&self, _ctx: &CallContext, symbol: &str) -> Result<CompanyProfile> {
        self.hit();
        self.profiles.get(symbol).cloned().ok_or_else(|| missing("profile", symbol))
    }
}

#[async_trait]
impl BarProvider for FakeMarket {
    async fn fetch_intraday_bars(
        &self,
        _ctx: &CallContext,
        symbol: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<IntradayBars> {
        self.hit();
        // the provider echoes a normalized ticker
        let canonical = symbol.to_uppercase();
        let bars = self.bars.get(&canonical).cloned().ok_or_else(|| missing("bars", symbol))?;
        Ok(IntradayBars { symbol: canonical, bars })
    }
}

#[async_trait]
impl FundamentalsProvider for FakeMarket {
    async fn fetch_overview(&self, _ctx: &CallContext, symbol: &str) -> Result<CompanyOverview> {
        self.hit();
        self.overviews.get(symbol).cloned().ok_or_else(|| missing("overview", symbol))
    }

    async fn fetch_income_statement(&self, _ctx: &CallContext, symbol: &str) -> Result<Vec<IncomeReport>> {
        self.hit();
        self.income.get(symbol).cloned().ok_or_else(|| missing("income", symbol))
    }

    async fn fetch_balance_sheet(&self, _ctx: &CallContext, symbol: &str) -> Result<Vec<BalanceReport>> {
        self.hit();
        self.balance.get(symbol).cloned().ok_or_else(|| missing("balance", symbol))
    }
}

/// `MemoryStore` that refuses selected writes.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_bars_at: HashSet<DateTime<Utc>>,
    pub fail_symbols: HashSet<String>,
}

fn refused(what: &str) -> AppError {
    AppError::Persistence(format!("write refused: {what}"))
}

#[async_trait]
impl StockStore for FlakyStore {
    async fn upsert_bar(&self, bar: &StockBar) -> Result<()> {
        if self.fail_bars_at.contains(&bar.timestamp) {
            return Err(refused("bar"));
        }
        self.inner.upsert_bar(bar).await
    }

    async fn latest_bar(&self, symbol: &str) -> Result<Option<StockBar>> {
        self.inner.latest_bar(symbol).await
    }

    async fn bars_between(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<StockBar>> {
        self.inner.bars_between(symbol, start, end).await
    }

    async fn upsert_symbol(&self, symbol: &StockSymbol) -> Result<()> {
        if self.fail_symbols.contains(&symbol.symbol) {
            return Err(refused("symbol"));
        }
        self.inner.upsert_symbol(symbol).await
    }

    async fn symbols_in_batch(&self, batch_id: i64) -> Result<Vec<String>> {
        self.inner.symbols_in_batch(batch_id).await
    }

    async fn upsert_metadata(&self, metadata: &StockMetadata) -> Result<()> {
        if self.fail_symbols.contains(&metadata.symbol) {
            return Err(refused("metadata"));
        }
        self.inner.upsert_metadata(metadata).await
    }

    async fn get_metadata(&self, symbol: &str) -> Result<Option<StockMetadata>> {
        self.inner.get_metadata(symbol).await
    }

    async fn list_metadata(&self) -> Result<Vec<StockMetadata>> {
        self.inner.list_metadata().await
    }

    async fn delete_metadata(&self, symbol: &str) -> Result<bool> {
        self.inner.delete_metadata(symbol).await
    }

    async fn upsert_overview(&self, overview: &CompanyOverview) -> Result<()> {
        if self.fail_symbols.contains(&overview.symbol) {
            return Err(refused("overview"));
        }
        self.inner.upsert_overview(overview).await
    }

    async fn get_overview(&self, symbol: &str) -> Result<Option<CompanyOverview>> {
        self.inner.get_overview(symbol).await
    }

    async fn upsert_income_reports(&self, reports: &[IncomeReport]) -> Result<()> {
        self.inner.upsert_income_reports(reports).await
    }

    async fn income_reports(&self, symbol: &str) -> Result<Vec<IncomeReport>> {
        self.inner.income_reports(symbol).await
    }

    async fn upsert_balance_reports(&self, reports: &[BalanceReport]) -> Result<()> {
        self.inner.upsert_balance_reports(reports).await
    }

    async fn balance_reports(&self, symbol: &str) -> Result<Vec<BalanceReport>> {
        self.inner.balance_reports(symbol).await
    }

    async fn upsert_scorecard(&self, card: &Scorecard) -> Result<()> {
        self.inner.upsert_scorecard(card).await
    }

    async fn get_scorecard(&self, symbol: &str) -> Result<Option<Scorecard>> {
        self.inner.get_scorecard(symbol).await
    }
}

// ---------------- Builders ----------------

pub fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn bar(symbol: &str, at: DateTime<Utc>, close: f64) -> StockBar {
    StockBar {
        symbol: symbol.to_string(),
        timestamp: at,
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1_000.0,
    }
}

/// `count` five-minute bars starting 2024-01-02 14:30 UTC.
pub fn bars(symbol: &str, count: u32) -> Vec<StockBar> {
    (0..count)
        .map(|i| bar(symbol, ts(2024, 1, 2, 14, 30) + chrono::Duration::minutes(5 * i as i64), 100.0 + i as f64))
        .collect()
}

pub fn listing(symbol: &str, kind: &str) -> SymbolListing {
    SymbolListing {
        symbol: symbol.to_string(),
        display_symbol: symbol.to_string(),
        description: format!("{symbol} INC"),
        currency: "USD".to_string(),
        kind: kind.to_string(),
        mic: Some("XNAS".to_string()),
        figi: None,
    }
}

pub fn profile(symbol: &str, name: &str) -> CompanyProfile {
    CompanyProfile {
        ticker: symbol.to_string(),
        name: Some(name.to_string()),
        industry: Some("Technology".to_string()),
        exchange: Some("NASDAQ".to_string()),
        currency: Some("USD".to_string()),
        country: Some("US".to_string()),
        market_cap: Some(2_500_000.0),
        shares_outstanding: Some(15_000.0),
        website: Some(format!("https://{}.example.com", symbol.to_lowercase())),
        ipo: None,
    }
}

pub fn overview(symbol: &str) -> CompanyOverview {
    CompanyOverview {
        symbol: symbol.to_string(),
        name: Some(format!("{symbol} Corp")),
        pe_ratio: Some(28.5),
        peg_ratio: Some(2.1),
        price_to_book: Some(45.0),
        return_on_equity_ttm: Some(1.47),
        operating_margin: Some(0.30),
        profit_margin: Some(0.25),
        dividend_yield: Some(0.0),
        beta: None,
    }
}

pub fn income(symbol: &str, year: i32, revenue: f64, net: f64) -> IncomeReport {
    IncomeReport {
        symbol: symbol.to_string(),
        fiscal_date_ending: format!("{year}-09-30"),
        total_revenue: Some(revenue),
        net_income: Some(net),
    }
}

pub fn balance(symbol: &str, year: i32, equity: f64) -> BalanceReport {
    BalanceReport {
        symbol: symbol.to_string(),
        fiscal_date_ending: format!("{year}-09-30"),
        total_shareholder_equity: Some(equity),
    }
}

pub fn quote(symbol: &str, price: f64, day: NaiveDate) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        open: Some(price - 1.0),
        high: Some(price + 1.0),
        low: Some(price - 2.0),
        price: Some(price),
        volume: Some(5_000.0),
        latest_trading_day: Some(day),
        previous_close: Some(price - 0.5),
        change: Some(0.5),
        change_percent: Some(0.25),
    }
}

// ---------------- Wiring ----------------

pub fn extraction_service(market: Arc<FakeMarket>, store: Arc<dyn StockStore>) -> DataExtractionService {
    DataExtractionService::new(market.clone(), market.clone(), market.clone(), market, store)
}

pub fn test_state(market: Arc<FakeMarket>, store: Arc<dyn StockStore>) -> AppState {
    let settings = config::load();

    AppState {
        settings,
        store: store.clone(),
        extraction: Arc::new(extraction_service(market, store.clone())),
        scorecards: Arc::new(ScorecardService::new(store)),
    }
}

pub async fn response_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
