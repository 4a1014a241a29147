use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderCredential;
use crate::error::{AppError, Result};
use crate::models::{CompanyProfile, SymbolListing};
use crate::services::api_client::{ApiClient, ApiRequest};
use crate::services::context::CallContext;
use crate::services::providers::SymbolProvider;

pub const BASE_URL: &str = "https://finnhub.io/api/v1";

pub const TOKEN_HEADER: &str = "X-Finnhub-Token";

pub struct FinnhubClient {
    api: ApiClient,
}

impl FinnhubClient {
    pub fn new(credential: ProviderCredential, timeout: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, credential, timeout)
    }

    pub fn with_base_url(base_url: &str, credential: ProviderCredential, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, credential, timeout)?.with_api_key_header(TOKEN_HEADER),
        })
    }
}

#[async_trait]
impl SymbolProvider for FinnhubClient {
    async fn fetch_symbols(&self, ctx: &CallContext, exchange: &str) -> Result<Vec<SymbolListing>> {
        tracing::info!(exchange, "fetching stock symbols");

        let req = ApiRequest::get("/stock/symbol")
            .query("exchange", exchange);

        let items: Vec<SymbolItem> = self.api.execute_json(ctx, &req).await?;

        tracing::info!(exchange, count = items.len(), "fetched stock symbols");
        Ok(items.into_iter().map(SymbolItem::into_listing).collect())
    }

    async fn fetch_company_profile(&self, ctx: &CallContext, symbol: &str) -> Result<CompanyProfile> {
        tracing::info!(symbol, "fetching company profile");

        let req = ApiRequest::get("/stock/profile2").query("symbol", symbol);

        let res: ProfileResponse = self.api.execute_json(ctx, &req).await?;

        // unknown symbols come back as `{}`
        if non_empty(res.ticker.clone()).is_none() && non_empty(res.name.clone()).is_none() {
            return Err(AppError::NotFound(format!("company profile for {symbol}")));
        }

        let profile = res.into_profile(symbol);
        tracing::info!(symbol, name = profile.name.as_deref().unwrap_or(""), "fetched company profile");
        Ok(profile)
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SymbolItem {
    #[serde(default)]
    pub currency: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "displaySymbol", default)]
    pub display_symbol: String,

    #[serde(default)]
    pub figi: Option<String>,

    #[serde(default)]
    pub mic: Option<String>,

    pub symbol: String,

    #[serde(rename = "type", default)]
    pub kind: String,
}

impl SymbolItem {
    fn into_listing(self) -> SymbolListing {
        SymbolListing {
            symbol: self.symbol,
            display_symbol: self.display_symbol,
            description: self.description,
            currency: self.currency,
            kind: self.kind,
            mic: non_empty(self.mic),
            figi: non_empty(self.figi),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProfileResponse {
    pub country: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub ipo: Option<String>,

    #[serde(rename = "marketCapitalization")]
    pub market_capitalization: Option<f64>,

    pub name: Option<String>,

    #[serde(rename = "shareOutstanding")]
    pub share_outstanding: Option<f64>,

    pub ticker: Option<String>,
    pub weburl: Option<String>,

    #[serde(rename = "finnhubIndustry")]
    pub finnhub_industry: Option<String>,
}

impl ProfileResponse {
    fn into_profile(self, requested: &str) -> CompanyProfile {
        CompanyProfile {
            ticker: non_empty(self.ticker).unwrap_or_else(|| requested.to_string()),
            name: non_empty(self.name),
            industry: non_empty(self.finnhub_industry),
            exchange: non_empty(self.exchange),
            currency: non_empty(self.currency),
            country: non_empty(self.country),
            market_cap: self.market_capitalization,
            shares_outstanding: self.share_outstanding,
            website: non_empty(self.weburl),
            ipo: non_empty(self.ipo),
        }
    }
}
