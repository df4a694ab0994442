pub mod http_client;

use crate::models::{AnalysisRequest, AnalysisResult, AssetHit, HealthStatus};
use async_trait::async_trait;
use thiserror::Error;

pub use self::http_client::HttpAnalysisApi;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures talking to the analysis backend. None of these are fatal to the
/// dashboard; callers log them and keep their previous state.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Status { status: u16, message: Option<String> },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable analysis backend.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// `GET /api/analyze/{TICKER}`
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ApiError>;

    /// `GET /api/search/{query}`
    async fn suggest(&self, query: &str) -> Result<Vec<AssetHit>, ApiError>;

    /// `GET /api/health`
    async fn health(&self) -> Result<HealthStatus, ApiError>;
}
