use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{
    BalanceReport, CompanyOverview, IncomeReport, Scorecard, StockBar, StockMetadata, StockSymbol,
};
use crate::services::store::StockStore;

#[derive(Default)]
struct Tables {
    bars: HashMap<String, BTreeMap<DateTime<Utc>, StockBar>>,
    symbols: BTreeMap<String, StockSymbol>,
    metadata: BTreeMap<String, StockMetadata>,
    overviews: HashMap<String, CompanyOverview>,
    income: HashMap<String, BTreeMap<String, IncomeReport>>,
    balance: HashMap<String, BTreeMap<String, BalanceReport>>,
    scorecards: HashMap<String, Scorecard>,
}

/// In-process store with the same keying rules as `MongoStore`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn bar_count(&self, symbol: &str) -> usize {
        self.tables.lock().await.bars.get(symbol).map_or(0, |b| b.len())
    }

    pub async fn symbols(&self) -> Vec<StockSymbol> {
        self.tables.lock().await.symbols.values().cloned().collect()
    }
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn upsert_bar(&self, bar: &StockBar) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.bars
            .entry(bar.symbol.clone())
            .or_default()
            .insert(bar.timestamp, bar.clone());
        Ok(())
    }

    async fn latest_bar(&self, symbol: &str) -> Result<Option<StockBar>> {
        let t = self.tables.lock().await;
        Ok(t.bars
            .get(symbol)
            .and_then(|b| b.values().next_back().cloned()))
    }

    async fn bars_between(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<StockBar>> {
        if start > end {
            return Ok(vec![]);
        }
        let t = self.tables.lock().await;
        Ok(t.bars
            .get(symbol)
            .map(|b| b.range(start..=end).rev().map(|(_, v)| v.clone()).collect())
            .unwrap_or_default())
    }

    async fn upsert_symbol(&self, symbol: &StockSymbol) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.symbols.insert(symbol.symbol.clone(), symbol.clone());
        Ok(())
    }

    async fn symbols_in_batch(&self, batch_id: i64) -> Result<Vec<String>> {
        let t = self.tables.lock().await;
        Ok(t.symbols
            .values()
            .filter(|s| s.batch_id == batch_id)
            .map(|s| s.symbol.clone())
            .collect())
    }

    async fn upsert_metadata(&self, metadata: &StockMetadata) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.metadata.insert(metadata.symbol.clone(), metadata.clone());
        Ok(())
    }

    async fn get_metadata(&self, symbol: &str) -> Result<Option<StockMetadata>> {
        Ok(self.tables.lock().await.metadata.get(symbol).cloned())
    }

    async fn list_metadata(&self) -> Result<Vec<StockMetadata>> {
        Ok(self.tables.lock().await.metadata.values().cloned().collect())
    }

    async fn delete_metadata(&self, symbol: &str) -> Result<bool> {
        Ok(self.tables.lock().await.metadata.remove(symbol).is_some())
    }

    async fn upsert_overview(&self, overview: &CompanyOverview) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.overviews.insert(overview.symbol.clone(), overview.clone());
        Ok(())
    }

    async fn get_overview(&self, symbol: &str) -> Result<Option<CompanyOverview>> {
        Ok(self.tables.lock().await.overviews.get(symbol).cloned())
    }

    async fn upsert_income_reports(&self, reports: &[IncomeReport]) -> Result<()> {
        let mut t = self.tables.lock().await;
        for r in reports {
            t.income
                .entry(r.symbol.clone())
                .or_default()
                .insert(r.fiscal_date_ending.clone(), r.clone());
        }
        Ok(())
    }

    async fn income_reports(&self, symbol: &str) -> Result<Vec<IncomeReport>> {
        let t = self.tables.lock().await;
        Ok(t.income
            .get(symbol)
            .map(|m| m.values().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_balance_reports(&self, reports: &[BalanceReport]) -> Result<()> {
        let mut t = self.tables.lock().await;
        for r in reports {
            t.balance
                .entry(r.symbol.clone())
                .or_default()
                .insert(r.fiscal_date_ending.clone(), r.clone());
        }
        Ok(())
    }

    async fn balance_reports(&self, symbol: &str) -> Result<Vec<BalanceReport>> {
        let t = self.tables.lock().await;
        Ok(t.balance
            .get(symbol)
            .map(|m| m.values().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_scorecard(&self, card: &Scorecard) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.scorecards.insert(card.symbol.clone(), card.clone());
        Ok(())
    }

    async fn get_scorecard(&self, symbol: &str) -> Result<Option<Scorecard>> {
        Ok(self.tables.lock().await.scorecards.get(symbol).cloned())
    }
}
