use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneOptions, FindOptions, ReplaceOptions};
use mongodb::{Collection, Database};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{
    BalanceReport, CompanyOverview, IncomeReport, Scorecard, StockBar, StockMetadata, StockSymbol,
};
use crate::services::db_init;
use crate::services::store::StockStore;

/// Bars are stored with an epoch-millisecond key so range scans and the
/// unique index work on a plain integer.
#[derive(Debug, Serialize, Deserialize)]
struct BarDoc {
    symbol: String,
    ts: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<&StockBar> for BarDoc {
    fn from(b: &StockBar) -> Self {
        Self {
            symbol: b.symbol.clone(),
            ts: b.timestamp.timestamp_millis(),
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
        }
    }
}

impl BarDoc {
    fn into_bar(self) -> Result<StockBar> {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(self.ts)
            .ok_or_else(|| AppError::Persistence(format!("stored bar timestamp out of range: {}", self.ts)))?;
        Ok(StockBar {
            symbol: self.symbol,
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

fn upsert() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

async fn collect<T>(col: &Collection<T>, filter: Document, opts: FindOptions) -> Result<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut cursor = col.find(filter, opts).await?;

    let mut out: Vec<T> = vec![];
    while let Some(res) = cursor.next().await {
        out.push(res?);
    }
    Ok(out)
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(uri).await?;
        let db = client.database(db_name);
        db_init::ensure_indexes(&db).await?;
        Ok(Self { db })
    }

    pub async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    fn col<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection::<T>(name)
    }
}

#[async_trait]
impl StockStore for MongoStore {
    async fn upsert_bar(&self, bar: &StockBar) -> Result<()> {
        let d = BarDoc::from(bar);
        self.col::<BarDoc>(db_init::BARS)
            .replace_one(doc! { "symbol": &d.symbol, "ts": d.ts }, &d, upsert())
            .await?;
        Ok(())
    }

    async fn latest_bar(&self, symbol: &str) -> Result<Option<StockBar>> {
        let opts = FindOneOptions::builder().sort(doc! { "ts": -1 }).build();
        self.col::<BarDoc>(db_init::BARS)
            .find_one(doc! { "symbol": symbol }, opts)
            .await?
            .map(BarDoc::into_bar)
            .transpose()
    }

    async fn bars_between(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<StockBar>> {
        let filter = doc! {
            "symbol": symbol,
            "ts": { "$gte": start.timestamp_millis(), "$lte": end.timestamp_millis() },
        };
        let opts = FindOptions::builder().sort(doc! { "ts": -1 }).build();

        collect(&self.col::<BarDoc>(db_init::BARS), filter, opts)
            .await?
            .into_iter()
            .map(BarDoc::into_bar)
            .collect()
    }

    async fn upsert_symbol(&self, symbol: &StockSymbol) -> Result<()> {
        self.col::<StockSymbol>(db_init::SYMBOLS)
            .replace_one(doc! { "symbol": &symbol.symbol }, symbol, upsert())
            .await?;
        Ok(())
    }

    async fn symbols_in_batch(&self, batch_id: i64) -> Result<Vec<String>> {
        let opts = FindOptions::builder().sort(doc! { "symbol": 1 }).build();
        let rows = collect(&self.col::<StockSymbol>(db_init::SYMBOLS), doc! { "batch_id": batch_id }, opts).await?;
        Ok(rows.into_iter().map(|s| s.symbol).collect())
    }

    async fn upsert_metadata(&self, metadata: &StockMetadata) -> Result<()> {
        self.col::<StockMetadata>(db_init::METADATA)
            .replace_one(doc! { "symbol": &metadata.symbol }, metadata, upsert())
            .await?;
        Ok(())
    }

    async fn get_metadata(&self, symbol: &str) -> Result<Option<StockMetadata>> {
        Ok(self
            .col::<StockMetadata>(db_init::METADATA)
            .find_one(doc! { "symbol": symbol }, None)
            .await?)
    }

    async fn list_metadata(&self) -> Result<Vec<StockMetadata>> {
        let opts = FindOptions::builder().sort(doc! { "symbol": 1 }).build();
        collect(&self.col::<StockMetadata>(db_init::METADATA), doc! {}, opts).await
    }

    async fn delete_metadata(&self, symbol: &str) -> Result<bool> {
        let res = self
            .col::<Document>(db_init::METADATA)
            .delete_one(doc! { "symbol": symbol }, None)
            .await?;
        tracing::info!(symbol, deleted = res.deleted_count, "deleted metadata");
        Ok(res.deleted_count > 0)
    }

    async fn upsert_overview(&self, overview: &CompanyOverview) -> Result<()> {
        self.col::<CompanyOverview>(db_init::OVERVIEWS)
            .replace_one(doc! { "symbol": &overview.symbol }, overview, upsert())
            .await?;
        Ok(())
    }

    async fn get_overview(&self, symbol: &str) -> Result<Option<CompanyOverview>> {
        Ok(self
            .col::<CompanyOverview>(db_init::OVERVIEWS)
            .find_one(doc! { "symbol": symbol }, None)
            .await?)
    }

    async fn upsert_income_reports(&self, reports: &[IncomeReport]) -> Result<()> {
        let col = self.col::<IncomeReport>(db_init::INCOME_STATEMENTS);
        for r in reports {
            col.replace_one(
                doc! { "symbol": &r.symbol, "fiscal_date_ending": &r.fiscal_date_ending },
                r,
                upsert(),
            )
            .await
            .map_err(|e| AppError::Persistence(format!("income statement ({}): {e}", r.fiscal_date_ending)))?;
        }
        Ok(())
    }

    async fn income_reports(&self, symbol: &str) -> Result<Vec<IncomeReport>> {
        let opts = FindOptions::builder().sort(doc! { "fiscal_date_ending": -1 }).build();
        collect(&self.col::<IncomeReport>(db_init::INCOME_STATEMENTS), doc! { "symbol": symbol }, opts).await
    }

    async fn upsert_balance_reports(&self, reports: &[BalanceReport]) -> Result<()> {
        let col = self.col::<BalanceReport>(db_init::BALANCE_SHEETS);
        for r in reports {
            col.replace_one(
                doc! { "symbol": &r.symbol, "fiscal_date_ending": &r.fiscal_date_ending },
                r,
                upsert(),
            )
            .await
            .map_err(|e| AppError::Persistence(format!("balance sheet ({}): {e}", r.fiscal_date_ending)))?;
        }
        Ok(())
    }

    async fn balance_reports(&self, symbol: &str) -> Result<Vec<BalanceReport>> {
        let opts = FindOptions::builder().sort(doc! { "fiscal_date_ending": -1 }).build();
        collect(&self.col::<BalanceReport>(db_init::BALANCE_SHEETS), doc! { "symbol": symbol }, opts).await
    }

    async fn upsert_scorecard(&self, card: &Scorecard) -> Result<()> {
        self.col::<Scorecard>(db_init::SCORECARDS)
            .replace_one(doc! { "symbol": &card.symbol }, card, upsert())
            .await?;
        Ok(())
    }

    async fn get_scorecard(&self, symbol: &str) -> Result<Option<Scorecard>> {
        Ok(self
            .col::<Scorecard>(db_init::SCORECARDS)
            .find_one(doc! { "symbol": symbol }, None)
            .await?)
    }
}
