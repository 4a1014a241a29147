use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{StockBar, StockMetadata};
use crate::services::store::StockStore;

/// Close of the most recent stored bar for `symbol`. A symbol with no bars is
/// a lookup failure like any other.
pub async fn latest_price(store: &dyn StockStore, symbol: &str) -> Result<f64> {
    store
        .latest_bar(symbol)
        .await?
        .map(|b| b.close)
        .ok_or_else(|| AppError::NoDataStored(symbol.to_string()))
}

/// Stored bars in `[start, end]`, newest first.
pub async fn bars_in_range(
    store: &dyn StockStore,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<StockBar>> {
    if start > end {
        return Err(AppError::InvalidInput("start date is after end date".to_string()));
    }
    store.bars_between(symbol, start, end).await
}

pub async fn metadata(store: &dyn StockStore, symbol: &str) -> Result<StockMetadata> {
    store
        .get_metadata(symbol)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("metadata for {symbol}")))
}

pub async fn all_metadata(store: &dyn StockStore) -> Result<Vec<StockMetadata>> {
    store.list_metadata().await
}

/// Upsert a posted metadata row, stamping `updated_at`.
pub async fn store_metadata(store: &dyn StockStore, mut metadata: StockMetadata) -> Result<StockMetadata> {
    metadata.symbol = metadata.symbol.trim().to_string();
    if metadata.symbol.is_empty() {
        return Err(AppError::InvalidInput("symbol is required".to_string()));
    }
    metadata.updated_at = Utc::now().timestamp();
    store.upsert_metadata(&metadata).await?;
    tracing::info!(symbol = %metadata.symbol, "stored metadata");
    Ok(metadata)
}

pub async fn delete_metadata(store: &dyn StockStore, symbol: &str) -> Result<()> {
    if store.delete_metadata(symbol).await? {
        tracing::info!(symbol, "deleted metadata");
        Ok(())
    } else {
        Err(AppError::NotFound(format!("metadata for {symbol}")))
    }
}

pub async fn symbols_in_batch(store: &dyn StockStore, batch_id: i64) -> Result<Vec<String>> {
    if batch_id < 0 {
        return Err(AppError::InvalidInput("batch_id must not be negative".to_string()));
    }
    store.symbols_in_batch(batch_id).await
}
