use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Database, IndexModel,
};

use crate::error::Result;

pub const BARS: &str = "stocks_raw";
pub const SYMBOLS: &str = "stock_symbols";
pub const METADATA: &str = "stocks_metadata";
pub const OVERVIEWS: &str = "stock_overviews";
pub const INCOME_STATEMENTS: &str = "stock_income_statements";
pub const BALANCE_SHEETS: &str = "stock_balance_sheets";
pub const SCORECARDS: &str = "stock_scorecards";

async fn unique_index(db: &Database, collection: &str, keys: Document) -> Result<()> {
    let col = db.collection::<Document>(collection);
    let model = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build();

    col.create_index(model, None).await?;
    Ok(())
}

/// Unique indexes backing every upsert key.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    // bars: unique per (symbol, timestamp)
    unique_index(db, BARS, doc! { "symbol": 1, "ts": 1 }).await?;

    unique_index(db, SYMBOLS, doc! { "symbol": 1 }).await?;
    unique_index(db, METADATA, doc! { "symbol": 1 }).await?;
    unique_index(db, OVERVIEWS, doc! { "symbol": 1 }).await?;
    unique_index(db, SCORECARDS, doc! { "symbol": 1 }).await?;

    // statements: unique per (symbol, fiscal date)
    unique_index(db, INCOME_STATEMENTS, doc! { "symbol": 1, "fiscal_date_ending": 1 }).await?;
    unique_index(db, BALANCE_SHEETS, doc! { "symbol": 1, "fiscal_date_ending": 1 }).await?;

    // batch scan used by the schedulers
    {
        let col = db.collection::<Document>(SYMBOLS);
        let model = IndexModel::builder().keys(doc! { "batch_id": 1 }).build();
        if let Err(e) = col.create_index(model, None).await {
            tracing::warn!(collection = SYMBOLS, error = %e, "failed to create batch_id index");
        }
    }

    Ok(())
}
