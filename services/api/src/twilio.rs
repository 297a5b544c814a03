//! Minimal Twilio REST client for placing outbound calls.

use crate::config::TwilioConfig;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::{error, info};

const TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Deserialize, Debug)]
struct CallResource {
    sid: String,
}

/// Places calls that Twilio will connect back to our TwiML endpoint.
#[derive(Clone, Debug)]
pub struct TwilioClient {
    http: reqwest::Client,
    api_base: String,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(http: reqwest::Client, config: TwilioConfig) -> Self {
        Self::with_api_base(http, config, TWILIO_API_BASE)
    }

    pub fn with_api_base(http: reqwest::Client, config: TwilioConfig, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            config,
        }
    }

    /// Dials `to` from the configured number; Twilio fetches `twiml_url` once
    /// the call is answered. Returns the call sid.
    pub async fn place_call(&self, to: &str, twiml_url: &str) -> Result<String> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base, self.config.account_sid
        );
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to),
                ("From", self.config.phone_number.as_str()),
                ("Url", twiml_url),
            ])
            .send()
            .await
            .context("Failed to reach the Twilio API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Twilio rejected the call request.");
            return Err(anyhow!("Twilio API returned {}", status));
        }

        let call: CallResource = response
            .json()
            .await
            .context("Twilio response did not contain a call sid")?;
        info!(call_sid = %call.sid, to, "Outbound call initiated.");
        Ok(call.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Form, Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn test_config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            phone_number: "+15550001111".to_string(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_place_call_returns_sid() {
        let router = Router::new().route(
            "/2010-04-01/Accounts/{account}/Calls.json",
            post(
                |Path(account): Path<String>,
                 headers: HeaderMap,
                 Form(form): Form<HashMap<String, String>>| async move {
                    assert_eq!(account, "AC123");
                    assert!(headers.contains_key("authorization"));
                    assert_eq!(form["To"], "+15552223333");
                    assert_eq!(form["From"], "+15550001111");
                    assert_eq!(form["Url"], "https://h/outbound-call-twiml?prompt=hi");
                    (StatusCode::CREATED, Json(json!({ "sid": "CA999" })))
                },
            ),
        );
        let base = serve(router).await;
        let client = TwilioClient::with_api_base(reqwest::Client::new(), test_config(), &base);

        let sid = client
            .place_call("+15552223333", "https://h/outbound-call-twiml?prompt=hi")
            .await
            .unwrap();
        assert_eq!(sid, "CA999");
    }

    #[tokio::test]
    async fn test_place_call_error_status() {
        let router = Router::new().route(
            "/2010-04-01/Accounts/{account}/Calls.json",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json::<Value>(json!({ "message": "invalid To number" })),
                )
            }),
        );
        let base = serve(router).await;
        let client = TwilioClient::with_api_base(reqwest::Client::new(), test_config(), &base);

        let err = client.place_call("nope", "https://h/x").await.unwrap_err();
        assert!(err.to_string().contains("400"));
    }
}
