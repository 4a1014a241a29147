//! Library entrypoint for StockHarvest.
//!
//! Integration tests under `tests/` import the app state, routers, controllers
//! and services from here.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub mod controllers;
pub mod routes;

use services::extraction_service::DataExtractionService;
use services::scorecard_service::ScorecardService;
use services::store::StockStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn StockStore>,
    pub extraction: Arc<DataExtractionService>,
    pub scorecards: Arc<ScorecardService>,
}
