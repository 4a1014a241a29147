use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{StockBar, StockMetadata, StockSymbol, COMMON_STOCK};
use crate::services::context::CallContext;
use crate::services::providers::{BarProvider, FundamentalsProvider, QuoteProvider, SymbolProvider};
use crate::services::store::StockStore;

/// Symbols per scheduling batch.
pub const SYMBOL_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionState {
    Pending,
    Fetching,
    Succeeded,
    PartialFailure,
    FailedNoData,
}

/// Per-call outcome counts.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub state: ExtractionState,
    /// Items attempted (bars, symbols, documents).
    pub processed: usize,
    pub stored: usize,
    pub failed: usize,
    /// Items deliberately not stored (filtered out, nothing to write).
    pub skipped: usize,
    #[serde(skip)]
    pub elapsed: Duration,
    #[serde(skip)]
    started: Option<Instant>,
}

impl Default for ExtractionSummary {
    fn default() -> Self {
        Self {
            state: ExtractionState::Pending,
            processed: 0,
            stored: 0,
            failed: 0,
            skipped: 0,
            elapsed: Duration::ZERO,
            started: None,
        }
    }
}

impl ExtractionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(&mut self) {
        self.state = ExtractionState::Fetching;
        self.started = Some(Instant::now());
    }

    fn finish(&mut self) {
        self.state = if self.stored == 0 {
            ExtractionState::FailedNoData
        } else if self.failed > 0 {
            ExtractionState::PartialFailure
        } else {
            ExtractionState::Succeeded
        };
        if let Some(t) = self.started {
            self.elapsed = t.elapsed();
        }
    }

    fn log_summary(&self, operation: &str, target: &str) {
        tracing::info!(
            operation,
            target,
            state = ?self.state,
            processed = self.processed,
            stored = self.stored,
            errors = self.failed,
            skipped = self.skipped,
            elapsed_secs = self.elapsed.as_secs_f64(),
            "extraction completed"
        );
    }

    /// `NoDataStored` unless at least one write succeeded.
    fn require_stored(self, target: String) -> Result<Self> {
        if self.stored == 0 {
            return Err(AppError::NoDataStored(target));
        }
        Ok(self)
    }
}

/// Coordinates provider calls and persistence for every extraction job.
/// Holds one adapter per capability and the persistence port, nothing else.
pub struct DataExtractionService {
    quotes: Arc<dyn QuoteProvider>,
    symbols: Arc<dyn SymbolProvider>,
    bars: Arc<dyn BarProvider>,
    fundamentals: Arc<dyn FundamentalsProvider>,
    store: Arc<dyn StockStore>,
}

impl DataExtractionService {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        symbols: Arc<dyn SymbolProvider>,
        bars: Arc<dyn BarProvider>,
        fundamentals: Arc<dyn FundamentalsProvider>,
        store: Arc<dyn StockStore>,
    ) -> Self {
        Self {
            quotes,
            symbols,
            bars,
            fundamentals,
            store,
        }
    }

    async fn store_bars(&self, symbol: &str, bars: &[StockBar], summary: &mut ExtractionSummary) {
        for bar in bars {
            summary.processed += 1;
            match self.store.upsert_bar(bar).await {
                Ok(()) => summary.stored += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol, date = %bar.timestamp, error = %e, "failed to store bar");
                }
            }
        }
    }

    /// Fetch intraday bars for one symbol and upsert them in the order received.
    pub async fn extract_and_store_bars(
        &self,
        ctx: &CallContext,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ExtractionSummary> {
        let mut summary = ExtractionSummary::new();
        summary.begin();
        tracing::info!(symbol, %from, %to, "starting bar extraction");

        let fetched = self.bars.fetch_intraday_bars(ctx, symbol, from, to).await?;
        tracing::info!(symbol = %fetched.symbol, count = fetched.bars.len(), "processing bars");

        self.store_bars(&fetched.symbol, &fetched.bars, &mut summary).await;

        summary.finish();
        summary.log_summary("bars", &fetched.symbol);
        summary.require_stored(format!("symbol {}", fetched.symbol))
    }

    /// Run `extract_and_store_bars` for each symbol in turn. Never fails: a
    /// symbol's failure is logged and counted. Once the deadline passes the
    /// remaining symbols are counted as failed without being attempted.
    pub async fn batch_extract(
        &self,
        ctx: &CallContext,
        symbols: &[String],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ExtractionSummary {
        let mut summary = ExtractionSummary::new();
        summary.begin();
        tracing::info!(count = symbols.len(), "starting batch extraction");

        for (i, symbol) in symbols.iter().enumerate() {
            summary.processed += 1;

            if ctx.is_expired() {
                let remaining = symbols.len() - i;
                summary.failed += remaining;
                summary.processed += remaining - 1;
                tracing::warn!(remaining, "deadline expired, abandoning batch");
                break;
            }

            tracing::info!(symbol = %symbol, "processing symbol {}/{}", i + 1, symbols.len());
            match self.extract_and_store_bars(ctx, symbol, from, to).await {
                Ok(_) => summary.stored += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %symbol, error = %e, "failed to extract bars");
                }
            }
        }

        summary.finish();
        summary.log_summary("batch", &format!("{} symbols", symbols.len()));
        summary
    }

    /// Store the exchange's common stocks, assigning consecutive groups of
    /// five (in listing order) the same batch id.
    pub async fn extract_and_store_symbols(&self, ctx: &CallContext, exchange: &str) -> Result<ExtractionSummary> {
        let mut summary = ExtractionSummary::new();
        summary.begin();

        let listings = self.symbols.fetch_symbols(ctx, exchange).await?;

        let accepted = listings.iter().filter(|l| l.kind == COMMON_STOCK);
        summary.skipped = listings.iter().filter(|l| l.kind != COMMON_STOCK).count();

        for (idx, listing) in accepted.enumerate() {
            summary.processed += 1;
            let row = StockSymbol {
                symbol: listing.symbol.clone(),
                batch_id: (idx / SYMBOL_BATCH_SIZE) as i64,
            };

            match self.store.upsert_symbol(&row).await {
                Ok(()) => summary.stored += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %row.symbol, exchange, error = %e, "failed to store symbol");
                }
            }
        }

        summary.finish();
        summary.log_summary("symbols", exchange);
        summary.require_stored(format!("exchange {exchange}"))
    }

    /// Store a metadata shell for each common stock of the exchange. Profile
    /// fields stay empty until `extract_and_store_company_data` fills them.
    pub async fn extract_and_store_metadata(&self, ctx: &CallContext, exchange: &str) -> Result<ExtractionSummary> {
        let mut summary = ExtractionSummary::new();
        summary.begin();
        tracing::info!(exchange, "starting metadata extraction");

        let listings = self.symbols.fetch_symbols(ctx, exchange).await?;

        for listing in listings {
            if listing.kind != COMMON_STOCK {
                summary.skipped += 1;
                continue;
            }
            summary.processed += 1;

            let metadata = StockMetadata {
                symbol: listing.symbol,
                company_name: None,
                industry: None,
                exchange: exchange.to_string(),
                currency: listing.currency,
                market_cap: None,
                description: listing.description,
                website: None,
                kind: listing.kind,
                updated_at: Utc::now().timestamp(),
            };

            match self.store.upsert_metadata(&metadata).await {
                Ok(()) => summary.stored += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %metadata.symbol, exchange, error = %e, "failed to store metadata");
                }
            }
        }

        summary.finish();
        summary.log_summary("metadata", exchange);
        summary.require_stored(format!("exchange {exchange}"))
    }

    async fn enrich_company(&self, ctx: &CallContext, symbol: &str) -> Result<bool> {
        let profile = self.symbols.fetch_company_profile(ctx, symbol).await?;

        let existing = self
            .store
            .get_metadata(symbol)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("metadata for {symbol}")))?;

        if !existing.is_common_stock() {
            return Ok(false);
        }

        let merged = StockMetadata {
            company_name: profile.name.or(existing.company_name),
            industry: profile.industry.or(existing.industry),
            market_cap: profile.market_cap.or(existing.market_cap),
            website: profile.website.or(existing.website),
            updated_at: Utc::now().timestamp(),
            ..existing
        };

        self.store.upsert_metadata(&merged).await?;
        Ok(true)
    }

    /// Merge company profiles into previously stored metadata shells. A symbol
    /// without a stored shell fails on its own without stopping the batch.
    pub async fn extract_and_store_company_data(&self, ctx: &CallContext, symbols: &[String]) -> Result<ExtractionSummary> {
        let mut summary = ExtractionSummary::new();
        summary.begin();

        for symbol in symbols {
            summary.processed += 1;
            match self.enrich_company(ctx, symbol).await {
                Ok(true) => {
                    summary.stored += 1;
                    tracing::info!(symbol = %symbol, "stored company profile");
                }
                Ok(false) => {
                    summary.skipped += 1;
                    tracing::info!(symbol = %symbol, "not a common stock, profile not stored");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %symbol, error = %e, "failed to extract company profile");
                }
            }
        }

        summary.finish();
        summary.log_summary("company_profile", &format!("{} symbols", symbols.len()));
        summary.require_stored("provided symbols".to_string())
    }

    pub async fn batch_extract_overview(&self, ctx: &CallContext, symbols: &[String]) -> ExtractionSummary {
        let mut summary = ExtractionSummary::new();
        summary.begin();

        for symbol in symbols {
            summary.processed += 1;
            let res = match self.fundamentals.fetch_overview(ctx, symbol).await {
                Ok(overview) => self.store.upsert_overview(&overview).await,
                Err(e) => Err(e),
            };
            match res {
                Ok(()) => summary.stored += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %symbol, error = %e, "failed to extract overview");
                }
            }
        }

        summary.finish();
        summary.log_summary("overview", &format!("{} symbols", symbols.len()));
        summary
    }

    pub async fn batch_extract_income_statement(&self, ctx: &CallContext, symbols: &[String]) -> ExtractionSummary {
        let mut summary = ExtractionSummary::new();
        summary.begin();

        for symbol in symbols {
            summary.processed += 1;
            let reports = match self.fundamentals.fetch_income_statement(ctx, symbol).await {
                Ok(r) => r,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %symbol, error = %e, "failed to get income statement");
                    continue;
                }
            };
            if reports.is_empty() {
                summary.skipped += 1;
                tracing::info!(symbol = %symbol, "no annual income reports");
                continue;
            }
            match self.store.upsert_income_reports(&reports).await {
                Ok(()) => summary.stored += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %symbol, error = %e, "failed to store income statement");
                }
            }
        }

        summary.finish();
        summary.log_summary("income_statement", &format!("{} symbols", symbols.len()));
        summary
    }

    pub async fn batch_extract_balance_sheet(&self, ctx: &CallContext, symbols: &[String]) -> ExtractionSummary {
        let mut summary = ExtractionSummary::new();
        summary.begin();

        for symbol in symbols {
            summary.processed += 1;
            let reports = match self.fundamentals.fetch_balance_sheet(ctx, symbol).await {
                Ok(r) => r,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %symbol, error = %e, "failed to get balance sheet");
                    continue;
                }
            };
            if reports.is_empty() {
                summary.skipped += 1;
                tracing::info!(symbol = %symbol, "no annual balance sheets");
                continue;
            }
            match self.store.upsert_balance_reports(&reports).await {
                Ok(()) => summary.stored += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(symbol = %symbol, error = %e, "failed to store balance sheet");
                }
            }
        }

        summary.finish();
        summary.log_summary("balance_sheet", &format!("{} symbols", symbols.len()));
        summary
    }

    /// Store the latest quote as a single bar (open = high = low = close =
    /// price) at midnight UTC of the latest trading day.
    pub async fn extract_latest_quote(&self, ctx: &CallContext, symbol: &str) -> Result<ExtractionSummary> {
        let mut summary = ExtractionSummary::new();
        summary.begin();

        let quote = self.quotes.fetch_quote(ctx, symbol).await?;

        let price = quote
            .price
            .ok_or_else(|| AppError::Decode(format!("quote for {symbol} has no price")))?;
        let day = quote
            .latest_trading_day
            .ok_or_else(|| AppError::Decode(format!("quote for {symbol} has no trading day")))?;
        let timestamp = day
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .ok_or_else(|| AppError::Decode(format!("bad trading day {day}")))?;

        let bar = StockBar {
            symbol: quote.symbol.clone(),
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: quote.volume.unwrap_or(0.0),
        };
        tracing::info!(symbol = %bar.symbol, date = %day, price, "storing latest quote");

        summary.processed = 1;
        self.store.upsert_bar(&bar).await?;
        summary.stored = 1;

        summary.finish();
        summary.log_summary("quote", symbol);
        Ok(summary)
    }

    /// Fetch the intraday series from the quote provider and upsert its bars.
    pub async fn extract_and_store_time_series(&self, ctx: &CallContext, symbol: &str) -> Result<ExtractionSummary> {
        let mut summary = ExtractionSummary::new();
        summary.begin();

        let bars = self.quotes.fetch_time_series(ctx, symbol).await?;
        self.store_bars(symbol, &bars, &mut summary).await;

        summary.finish();
        summary.log_summary("time_series", symbol);
        summary.require_stored(format!("symbol {symbol}"))
    }
}
