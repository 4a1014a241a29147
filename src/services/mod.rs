pub mod api_client;
pub mod context;
pub mod rate_limiter;

pub mod providers;
pub mod alphavantage;
pub mod finnhub;
pub mod polygon;

pub mod store;
pub mod db_init;
pub mod memory_store;
pub mod mongo_store;

pub mod extraction_service;
pub mod scorecard_service;
pub mod stocks_service;
