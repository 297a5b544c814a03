//! Opens the conversational-AI leg of a call.

use super::pump;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info};
use voicebridge_core::{
    RelayError,
    upstream::{LEG_CHANNEL_CAPACITY, Leg, UpstreamConnector},
};

#[derive(Deserialize, Debug)]
struct SignedUrlResponse {
    signed_url: String,
}

/// Connects to an ElevenLabs conversational agent through a signed URL.
///
/// Every call fetches its own signed URL: they are single-use and expire quickly.
#[derive(Clone)]
pub struct ElevenLabsConnector {
    http: reqwest::Client,
    api_base: String,
    agent_id: String,
    api_key: String,
}

impl ElevenLabsConnector {
    pub fn new(http: reqwest::Client, api_base: &str, agent_id: &str, api_key: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            agent_id: agent_id.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Asks the control plane for a fresh signed socket URL.
    pub async fn fetch_signed_url(&self) -> Result<String, RelayError> {
        let url = format!("{}/v1/convai/conversation/get_signed_url", self.api_base);
        let response = self
            .http
            .get(&url)
            .query(&[("agent_id", self.agent_id.as_str())])
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| RelayError::SignedUrl(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or(status.as_str());
            error!(%status, "Signed URL request was rejected.");
            return Err(RelayError::SignedUrl(status_text.to_string()));
        }

        let body: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| RelayError::SignedUrl(e.to_string()))?;
        debug!("Obtained signed URL.");
        Ok(body.signed_url)
    }
}

#[async_trait]
impl UpstreamConnector for ElevenLabsConnector {
    async fn connect(&self) -> Result<Leg, RelayError> {
        let signed_url = self.fetch_signed_url().await?;
        let (ws_stream, _) = connect_async(signed_url.as_str())
            .await
            .map_err(|e| RelayError::Connect(e.to_string()))?;
        info!("Connected to Conversational AI.");

        let (sink, stream) = ws_stream.split();
        let (leg, peer) = Leg::pair(LEG_CHANNEL_CAPACITY);
        pump::spawn_upstream(sink, stream, peer);
        Ok(leg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
    };
    use serde_json::json;
    use std::{
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{}", addr)
    }

    fn signing_endpoint(hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/v1/convai/conversation/get_signed_url",
            get(
                move |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| {
                    let hits = hits.clone();
                    async move {
                        let n = hits.fetch_add(1, Ordering::SeqCst);
                        let key = headers.get("xi-api-key").and_then(|v| v.to_str().ok());
                        if key != Some("good-key") {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        let agent = params.get("agent_id").cloned().unwrap_or_default();
                        Json(json!({ "signed_url": format!("wss://convai/{}/{}", agent, n) }))
                            .into_response()
                    }
                },
            ),
        )
    }

    #[tokio::test]
    async fn test_fetch_signed_url() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(signing_endpoint(hits.clone())).await;
        let connector = ElevenLabsConnector::new(reqwest::Client::new(), &base, "agent-1", "good-key");

        let first = connector.fetch_signed_url().await.unwrap();
        let second = connector.fetch_signed_url().await.unwrap();
        assert_eq!(first, "wss://convai/agent-1/0");
        assert_eq!(second, "wss://convai/agent-1/1");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_signed_url_rejected() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(signing_endpoint(hits.clone())).await;
        let connector = ElevenLabsConnector::new(reqwest::Client::new(), &base, "agent-1", "bad-key");

        let err = connector.fetch_signed_url().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get signed URL: Unauthorized");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_fails_without_signed_url() {
        let base = serve(signing_endpoint(Arc::new(AtomicUsize::new(0)))).await;
        let connector = ElevenLabsConnector::new(reqwest::Client::new(), &base, "agent-1", "bad-key");

        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, RelayError::SignedUrl(_)));
    }
}
