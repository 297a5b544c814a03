//! Main Entrypoint for the Voicebridge API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the shared clients (conversational-AI connector, Twilio).
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use voicebridge_api::{
    config::Config, router::create_router, state::AppState, twilio::TwilioClient,
    ws::upstream::ElevenLabsConnector,
};
use voicebridge_core::ConversationDefaults;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Clients ---
    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let connector = Arc::new(ElevenLabsConnector::new(
        http.clone(),
        &config.elevenlabs_api_base,
        &config.elevenlabs_agent_id,
        &config.elevenlabs_api_key,
    ));

    let twilio = match &config.twilio {
        Some(twilio_config) => Some(TwilioClient::new(http, twilio_config.clone())),
        None => {
            warn!("Twilio credentials not set. Outbound calling is disabled.");
            None
        }
    };

    let app_state = Arc::new(AppState {
        connector,
        twilio,
        conversation_defaults: ConversationDefaults {
            prompt: config.default_prompt.clone(),
            first_message: config.first_message.clone(),
        },
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        agent_id = %config.elevenlabs_agent_id,
        outbound_enabled = config.twilio.is_some(),
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
