use std::env;
use std::time::Duration;

/// API key plus per-minute request quota for one upstream provider.
#[derive(Debug, Clone)]
pub struct ProviderCredential {
    api_key: String,
    requests_per_minute: u32,
}

impl ProviderCredential {
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        Self {
            api_key: api_key.into(),
            requests_per_minute: requests_per_minute.max(1),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

/// Deadlines attached to extraction calls, by breadth of the job.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionTimeouts {
    pub single: Duration,
    pub exchange: Duration,
    pub batch: Duration,
}

impl Default for ExtractionTimeouts {
    fn default() -> Self {
        Self {
            single: Duration::from_secs(5 * 60),
            exchange: Duration::from_secs(15 * 60),
            batch: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub store_backend: StoreBackend,

    pub api_request_timeout: Duration,
    pub alpha_vantage: ProviderCredential,
    pub finnhub: ProviderCredential,
    pub polygon: ProviderCredential,

    pub timeouts: ExtractionTimeouts,
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env_u64(key).map(Duration::from_secs).unwrap_or(default)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8080);

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mongodb_db = env::var("MONGODB_DB").unwrap_or_else(|_| "stock_data".to_string());

    let store_backend = match env::var("STORE_BACKEND").ok().as_deref().map(str::trim) {
        Some("memory") => StoreBackend::Memory,
        _ => StoreBackend::Mongo,
    };

    let alpha_vantage = ProviderCredential::new(
        env::var("ALPHA_VANTAGE_API_KEY").unwrap_or_default(),
        env_u32("ALPHA_VANTAGE_RPM", 5),
    );
    let finnhub = ProviderCredential::new(
        env::var("FINNHUB_API_KEY").unwrap_or_default(),
        env_u32("FINNHUB_RPM", 60),
    );
    let polygon = ProviderCredential::new(
        env::var("POLYGON_API_KEY").unwrap_or_default(),
        env_u32("POLYGON_RPM", 60),
    );

    let defaults = ExtractionTimeouts::default();
    let timeouts = ExtractionTimeouts {
        single: env_secs("EXTRACT_SINGLE_TIMEOUT_SECS", defaults.single),
        exchange: env_secs("EXTRACT_EXCHANGE_TIMEOUT_SECS", defaults.exchange),
        batch: env_secs("EXTRACT_BATCH_TIMEOUT_SECS", defaults.batch),
    };

    Settings {
        host,
        port,
        mongodb_uri,
        mongodb_db,
        store_backend,
        api_request_timeout: env_secs("API_REQUEST_TIMEOUT_SECS", Duration::from_secs(30)),
        alpha_vantage,
        finnhub,
        polygon,
        timeouts,
    }
}
