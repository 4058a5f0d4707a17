//! API request and response types

use crate::state_machine::action::ResponseAction;
use serde::{Deserialize, Serialize};

/// One inbound chat message, as forwarded by the platform adapter
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub user_id: String,
    pub text: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// The bot's answer to one message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: Option<ResponseAction>,
    /// Nothing matched; the adapter should send its "didn't understand" text
    pub fallback: bool,
}

impl MessageResponse {
    pub fn new(reply: Option<ResponseAction>) -> Self {
        let fallback = !matches!(&reply, Some(action) if !action.is_empty());
        Self { reply, fallback }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub platform: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
