//! Source API clients
//!
//! - [`PosClient`]: paginated bulk order export (polling path)
//! - [`MarketplaceClient`]: GraphQL single-order lookup (identity resolution)

pub mod credential;
pub mod marketplace;
pub mod pos;

pub use credential::{CredentialProvider, StaticCredential};
pub use marketplace::MarketplaceClient;
pub use pos::{PosClient, PosOrderSource};

use thiserror::Error;

/// Source API failure; always transient from the pipeline's point of view
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream call timed out after {0} ms")]
    Timeout(u64),

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Classify a reqwest failure; `timeout_ms` is the configured client timeout
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Non-success responses become [`UpstreamError::Status`] carrying the body
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, UpstreamError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status { status, body })
}

/// 构建带超时的 HTTP 客户端
pub(crate) fn build_http_client(timeout_ms: u64) -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| UpstreamError::Transport(format!("failed to build HTTP client: {e}")))
}
