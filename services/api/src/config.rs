use std::net::SocketAddr;
use tracing::Level;
use voicebridge_core::translator::{DEFAULT_FIRST_MESSAGE, DEFAULT_PROMPT};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials for placing outbound calls through Twilio.
#[derive(Clone, Debug, PartialEq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub phone_number: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub elevenlabs_api_key: String,
    pub elevenlabs_agent_id: String,
    pub elevenlabs_api_base: String,
    pub twilio: Option<TwilioConfig>,
    pub default_prompt: String,
    pub first_message: String,
    pub log_level: Level,
}

const TWILIO_VARS: [&str; 3] = [
    "TWILIO_ACCOUNT_SID",
    "TWILIO_AUTH_TOKEN",
    "TWILIO_PHONE_NUMBER",
];

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str = match std::env::var("BIND_ADDRESS") {
            Ok(addr) => addr,
            Err(_) => {
                let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
                format!("0.0.0.0:{}", port)
            }
        };
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let elevenlabs_api_key = required("ELEVENLABS_API_KEY")?;
        let elevenlabs_agent_id = required("ELEVENLABS_AGENT_ID")?;
        let elevenlabs_api_base = std::env::var("ELEVENLABS_API_BASE")
            .unwrap_or_else(|_| "https://api.elevenlabs.io".to_string())
            .trim_end_matches('/')
            .to_string();

        let twilio = load_twilio()?;

        let default_prompt =
            std::env::var("DEFAULT_PROMPT").unwrap_or_else(|_| DEFAULT_PROMPT.to_string());
        let first_message =
            std::env::var("FIRST_MESSAGE").unwrap_or_else(|_| DEFAULT_FIRST_MESSAGE.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            elevenlabs_api_key,
            elevenlabs_agent_id,
            elevenlabs_api_base,
            twilio,
            default_prompt,
            first_message,
            log_level,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

/// Twilio settings are all-or-nothing: none set disables outbound calling.
fn load_twilio() -> Result<Option<TwilioConfig>, ConfigError> {
    let values: Vec<Option<String>> = TWILIO_VARS
        .iter()
        .map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .collect();

    if values.iter().all(Option::is_none) {
        return Ok(None);
    }
    if let Some(missing) = TWILIO_VARS
        .iter()
        .zip(&values)
        .find_map(|(name, value)| value.is_none().then_some(*name))
    {
        return Err(ConfigError::MissingVar(format!(
            "{} must be set when outbound calling is configured",
            missing
        )));
    }

    let mut values = values.into_iter().flatten();
    match (values.next(), values.next(), values.next()) {
        (Some(account_sid), Some(auth_token), Some(phone_number)) => Ok(Some(TwilioConfig {
            account_sid,
            auth_token,
            phone_number,
        })),
        _ => Err(ConfigError::MissingVar(TWILIO_VARS.join(", "))),
    }
}
