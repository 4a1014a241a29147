//! Error taxonomy shared by the client, provider, extraction and scorecard layers.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Network failure talking to a provider.
    #[error("transport error: {0}")]
    Transport(String),

    /// The limiter could not hand out a token before the caller's deadline.
    #[error("rate limit wait would exceed the request deadline")]
    RateLimitExceeded,

    #[error("request cancelled: deadline expired")]
    Cancelled,

    #[error("provider request failed with status {status}: {body}")]
    ProviderHttp { status: u16, body: String },

    #[error("failed to decode provider response: {0}")]
    Decode(String),

    #[error("no data was stored for {0}")]
    NoDataStored(String),

    #[error("missing {what} for {symbol}")]
    MissingFundamentals { symbol: String, what: &'static str },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // client-side timeouts are transport failures; `Cancelled` is for caller deadlines
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
