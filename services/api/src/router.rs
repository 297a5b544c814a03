//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the TwiML endpoints, the media-stream WebSockets, and OpenAPI
//! documentation.

use crate::{
    handlers,
    models::{ErrorResponse, HealthResponse, OutboundCallPayload, OutboundCallResponse},
    state::AppState,
    twiml::{INBOUND_STREAM_PATH, OUTBOUND_STREAM_PATH},
    ws::{inbound_stream_handler, outbound_stream_handler},
};

use axum::{
    Router,
    routing::{any, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::outbound_call),
    components(schemas(HealthResponse, OutboundCallPayload, OutboundCallResponse, ErrorResponse)),
    tags(
        (name = "Voicebridge API", description = "Telephony to conversational-AI call relay")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/", get(handlers::health))
        .route("/incoming-call-eleven", any(handlers::incoming_call_twiml))
        .route("/outbound-call", post(handlers::outbound_call))
        .route("/outbound-call-twiml", any(handlers::outbound_call_twiml))
        .route(INBOUND_STREAM_PATH, get(inbound_stream_handler))
        .route(OUTBOUND_STREAM_PATH, get(outbound_stream_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .layer(TraceLayer::new_for_http())
}
