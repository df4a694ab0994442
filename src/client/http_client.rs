use super::{AnalysisApi, ApiError};
use crate::config::ApiConfig;
use crate::models::{AnalysisRequest, AnalysisResult, AssetHit, ErrorBody, HealthStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP implementation of [`AnalysisApi`] against the Flask backend.
pub struct HttpAnalysisApi {
    inner: reqwest::Client,
    base_url: Url,
}

impl HttpAnalysisApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .with_context(|| format!("Invalid API base URL {:?}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL {:?} cannot carry a path", config.base_url);
        }

        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so a ticker can never escape its own segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Single GET, no retries. Non-2xx bodies are inspected for the backend's
    /// `{"error": ...}` envelope.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);

        let resp = self.inner.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .map(|b| b.error);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AnalysisApi for HttpAnalysisApi {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ApiError> {
        let url = self.endpoint(&["api", "analyze", request.ticker.as_str()])?;
        self.get_json(url).await
    }

    async fn suggest(&self, query: &str) -> Result<Vec<AssetHit>, ApiError> {
        let url = self.endpoint(&["api", "search", query.trim()])?;
        self.get_json(url).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint(&["api", "health"])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(base_url: String) -> HttpAnalysisApi {
        HttpAnalysisApi::new(&ApiConfig {
            base_url,
            timeout_secs: 5,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    fn analysis_body() -> serde_json::Value {
        json!({
            "score": 85,
            "recommendation": "FORTE COMPRA - Excelente ativo segundo o Método Society",
            "criteria_results": {
                "bom_roe": {"passed": true, "value": "18.00%", "description": "ROE de 18.00% (mínimo: 15%)"}
            },
            "basic_data": {
                "symbol": "ITUB4",
                "longName": "Itaú Unibanco Holding S.A.",
                "currency": "BRL",
                "regularMarketPrice": 32.1,
                "regularMarketChange": 0.3,
                "regularMarketChangePercent": 0.94,
                "marketCap": 310000000000.0
            }
        })
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let cfg = ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        };
        assert!(HttpAnalysisApi::new(&cfg).is_err());

        let cfg = ApiConfig {
            base_url: "mailto:someone@example.com".into(),
            ..ApiConfig::default()
        };
        assert!(HttpAnalysisApi::new(&cfg).is_err());
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = api_for("http://analysis.local:5000/proxy/".into());
        let url = api.endpoint(&["api", "analyze", "PETR4"]).unwrap();
        assert_eq!(url.as_str(), "http://analysis.local:5000/proxy/api/analyze/PETR4");

        let api = api_for("http://localhost:5000".into());
        let url = api.endpoint(&["api", "analyze", "A/B C"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/analyze/A%2FB%20C");
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/analyze/ITUB4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body()))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(server.uri());
        let request = AnalysisRequest::parse("itub4").unwrap();
        let result = api.analyze(&request).await.unwrap();

        assert_eq!(result.score, 85);
        assert_eq!(result.basic_data.symbol, "ITUB4");
        assert!(result.criteria_results["bom_roe"].passed);
    }

    #[tokio::test]
    async fn test_analyze_encodes_ticker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/analyze/BRK%20A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body()))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(server.uri());
        let request = AnalysisRequest::parse(" brk a ").unwrap();
        assert!(api.analyze(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_analyze_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/analyze/XXXX3"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "Erro interno: boom"})),
            )
            .mount(&server)
            .await;

        let api = api_for(server.uri());
        let err = api
            .analyze(&AnalysisRequest::parse("XXXX3").unwrap())
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.as_deref(), Some("Erro interno: boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_analyze_status_without_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<html>Not Found</html>"))
            .mount(&server)
            .await;

        let api = api_for(server.uri());
        let err = api
            .analyze(&AnalysisRequest::parse("NOPE3").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, message: None }));
    }

    #[tokio::test]
    async fn test_analyze_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"score\": "))
            .mount(&server)
            .await;

        let api = api_for(server.uri());
        let err = api
            .analyze(&AnalysisRequest::parse("PETR4").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        // Nothing listens on port 1.
        let api = api_for("http://127.0.0.1:1".into());
        let err = api.health().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_suggest_and_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search/FII"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"symbol": "HGLG11", "name": "CSHG Logística FII"},
                {"symbol": "KNRI11", "name": "Kinea Renda Imobiliária FII"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "message": "Society Analyzer API está funcionando",
                "token_status": "não configurado",
                "demo_mode": true,
                "timestamp": "2024-05-01T10:00:00"
            })))
            .mount(&server)
            .await;

        let api = api_for(server.uri());

        let hits = api.suggest(" FII ").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].symbol, "HGLG11");

        let health = api.health().await.unwrap();
        assert!(health.is_ok());
        assert!(health.demo_mode);
    }
}
