use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    BalanceReport, CompanyOverview, IncomeReport, Scorecard, StockBar, StockMetadata, StockSymbol,
};

/// Persistence port. Every `upsert_*` is keyed on the record's natural key
/// (symbol, symbol + timestamp, or symbol + fiscal date) and last writer wins.
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn upsert_bar(&self, bar: &StockBar) -> Result<()>;
    async fn latest_bar(&self, symbol: &str) -> Result<Option<StockBar>>;
    /// Bars in `[start, end]`, newest first.
    async fn bars_between(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<StockBar>>;

    async fn upsert_symbol(&self, symbol: &StockSymbol) -> Result<()>;
    async fn symbols_in_batch(&self, batch_id: i64) -> Result<Vec<String>>;

    /// Stored as given; callers stamp `updated_at`.
    async fn upsert_metadata(&self, metadata: &StockMetadata) -> Result<()>;
    async fn get_metadata(&self, symbol: &str) -> Result<Option<StockMetadata>>;
    async fn list_metadata(&self) -> Result<Vec<StockMetadata>>;
    async fn delete_metadata(&self, symbol: &str) -> Result<bool>;

    async fn upsert_overview(&self, overview: &CompanyOverview) -> Result<()>;
    async fn get_overview(&self, symbol: &str) -> Result<Option<CompanyOverview>>;

    async fn upsert_income_reports(&self, reports: &[IncomeReport]) -> Result<()>;
    /// Most recent fiscal date first.
    async fn income_reports(&self, symbol: &str) -> Result<Vec<IncomeReport>>;

    async fn upsert_balance_reports(&self, reports: &[BalanceReport]) -> Result<()>;
    /// Most recent fiscal date first.
    async fn balance_reports(&self, symbol: &str) -> Result<Vec<BalanceReport>>;

    async fn upsert_scorecard(&self, card: &Scorecard) -> Result<()>;
    async fn get_scorecard(&self, symbol: &str) -> Result<Option<Scorecard>>;
}
