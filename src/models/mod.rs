pub mod bar;
pub mod fundamentals;
pub mod listing;
pub mod metadata;
pub mod quote;
pub mod scorecard;

pub use bar::StockBar;
pub use fundamentals::{BalanceReport, CompanyOverview, IncomeReport};
pub use listing::{CompanyProfile, SymbolListing};
pub use metadata::{StockMetadata, StockSymbol, COMMON_STOCK};
pub use quote::Quote;
pub use scorecard::Scorecard;
