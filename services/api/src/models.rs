//! API Models
//!
//! Request and response bodies for the REST routes, annotated for `utoipa`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub message: String,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct OutboundCallPayload {
    /// Destination phone number in E.164 format.
    #[schema(example = "+15551234567")]
    pub number: Option<String>,
    /// Prompt for the agent; the configured default is used when absent.
    pub prompt: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundCallResponse {
    pub success: bool,
    pub message: String,
    pub call_sid: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
