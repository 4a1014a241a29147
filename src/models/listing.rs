use serde::{Deserialize, Serialize};

/// One entry of an exchange's symbol listing, unfiltered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolListing {
    pub symbol: String,
    pub display_symbol: String,
    pub description: String,
    pub currency: String,
    pub kind: String,
    pub mic: Option<String>,
    pub figi: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub ticker: String,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub country: Option<String>,
    pub market_cap: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub website: Option<String>,
    pub ipo: Option<String>,
}
