use serde::{Deserialize, Serialize};

/// Listing type accepted by the symbol and metadata passes.
pub const COMMON_STOCK: &str = "Common Stock";

/// Per-symbol metadata row. The optional fields stay empty until a company
/// profile pass enriches the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMetadata {
    pub symbol: String,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub exchange: String,
    pub currency: String,
    pub market_cap: Option<f64>,
    pub description: String,
    pub website: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub updated_at: i64,
}

impl StockMetadata {
    pub fn is_common_stock(&self) -> bool {
        self.kind == COMMON_STOCK
    }
}

/// Symbol assigned to a scheduling batch of five.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSymbol {
    pub symbol: String,
    pub batch_id: i64,
}
