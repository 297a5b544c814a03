//! Axum Handlers for the REST API
//!
//! This module contains the plain HTTP routes: the health check, the TwiML
//! documents the telephony platform fetches, and outbound call placement.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use crate::{
    models::{ErrorResponse, HealthResponse, OutboundCallPayload, OutboundCallResponse},
    state::AppState,
    twiml,
};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
    CallFailed(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    success: false,
                    error: message,
                }),
            )
                .into_response(),
            ApiError::Unavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    success: false,
                    error: message,
                }),
            )
                .into_response(),
            ApiError::CallFailed(err) => {
                error!("Error initiating outbound call: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        success: false,
                        error: "Failed to initiate call".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Reports that the server is up.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Server is running", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Server is running".to_string(),
    })
}

/// TwiML for an incoming call: stream its audio to the inbound relay.
pub async fn incoming_call_twiml(headers: HeaderMap) -> Response {
    xml(twiml::inbound_stream(&request_host(&headers)))
}

#[derive(Deserialize, Debug, Default)]
pub struct TwimlQuery {
    pub prompt: Option<String>,
}

/// TwiML for a call we placed: stream its audio to the outbound relay with the prompt attached.
pub async fn outbound_call_twiml(
    headers: HeaderMap,
    Query(query): Query<TwimlQuery>,
) -> Response {
    let prompt = query.prompt.unwrap_or_default();
    xml(twiml::outbound_stream(&request_host(&headers), &prompt))
}

/// Place an outbound call that will be connected to the conversational agent.
#[utoipa::path(
    post,
    path = "/outbound-call",
    request_body = OutboundCallPayload,
    responses(
        (status = 200, description = "Call initiated", body = OutboundCallResponse),
        (status = 400, description = "Phone number is required", body = ErrorResponse),
        (status = 500, description = "Failed to initiate call", body = ErrorResponse),
        (status = 503, description = "Outbound calling is not configured", body = ErrorResponse)
    )
)]
pub async fn outbound_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<OutboundCallPayload>,
) -> Result<Json<OutboundCallResponse>, ApiError> {
    let number = payload
        .number
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Phone number is required".to_string()))?;
    let twilio = state
        .twilio
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Outbound calling is not configured".to_string()))?;

    let prompt = payload.prompt.unwrap_or_default();
    let twiml_url = reqwest::Url::parse_with_params(
        &format!("https://{}/outbound-call-twiml", request_host(&headers)),
        &[("prompt", prompt.as_str())],
    )
    .map_err(|e| ApiError::CallFailed(e.into()))?;

    let call_sid = twilio
        .place_call(&number, twiml_url.as_str())
        .await
        .map_err(ApiError::CallFailed)?;

    Ok(Json(OutboundCallResponse {
        success: true,
        message: "Call initiated".to_string(),
        call_sid,
    }))
}

fn request_host(headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost")
        .to_string()
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}
