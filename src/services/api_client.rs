use std::collections::HashMap;
use std::time::Duration;

use reqwest::{header::HeaderMap, Client, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ProviderCredential;
use crate::error::{AppError, Result};
use crate::services::context::CallContext;
use crate::services::rate_limiter::RateLimiter;

/// Outbound request relative to a client's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            headers: HashMap::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// HTTP client bound to one provider: base URL, credential and its own
/// rate limiter.
pub struct ApiClient {
    http: Client,
    base_url: String,
    credential: ProviderCredential,
    api_key_header: Option<String>,
    limiter: RateLimiter,
}

impl ApiClient {
    pub fn new(base_url: &str, credential: ProviderCredential, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let limiter = RateLimiter::per_minute(credential.requests_per_minute());

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
            api_key_header: None,
            limiter,
        })
    }

    /// Also send the API key in this header on every request.
    pub fn with_api_key_header(mut self, name: &str) -> Self {
        self.api_key_header = Some(name.to_string());
        self
    }

    pub fn api_key(&self) -> &str {
        self.credential.api_key()
    }

    pub fn has_key(&self) -> bool {
        !self.credential.api_key().trim().is_empty()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Send the request once a limiter token is available. Non-2xx responses
    /// are returned as-is.
    pub async fn execute(&self, ctx: &CallContext, req: &ApiRequest) -> Result<RawResponse> {
        self.limiter.acquire(ctx).await?;

        let url = format!("{}{}", self.base_url, req.path);
        let mut builder = self.http.request(req.method.clone(), &url).query(&req.query);

        for (k, v) in &req.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(name) = &self.api_key_header {
            if self.has_key() {
                builder = builder.header(name.as_str(), self.credential.api_key());
            }
        }

        let send = async {
            let res = builder.send().await?;
            let status = res.status();
            let headers = res.headers().clone();
            let body = res.bytes().await?.to_vec();
            Ok::<_, reqwest::Error>(RawResponse { status, headers, body })
        };

        let res = match ctx.deadline() {
            Some(deadline) => tokio::time::timeout_at(deadline, send)
                .await
                .map_err(|_| AppError::Cancelled)??,
            None => send.await?,
        };

        tracing::debug!(path = %req.path, status = res.status.as_u16(), bytes = res.body.len(), "provider response");
        Ok(res)
    }

    /// `execute`, then decode the body into `T`. Status >= 400 fails before any
    /// decoding is attempted.
    pub async fn execute_json<T: DeserializeOwned>(&self, ctx: &CallContext, req: &ApiRequest) -> Result<T> {
        let res = self.execute(ctx, req).await?;

        if res.status.as_u16() >= 400 {
            return Err(AppError::ProviderHttp {
                status: res.status.as_u16(),
                body: String::from_utf8_lossy(&res.body).to_string(),
            });
        }

        Ok(serde_json::from_slice::<T>(&res.body)?)
    }
}
