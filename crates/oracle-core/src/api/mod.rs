//! Wire types and transport for `POST /api/ask/`

pub mod oracle;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub use oracle::OracleClient;

/// Request body sent to the ask endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskPayload {
    pub prompt: String,
    pub image_url: Option<String>,
    pub image_data_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_fallback: Option<bool>,
}

impl AskPayload {
    /// Build the base payload; blank image fields are sent as `null`
    pub fn new(prompt: &str, image_url: Option<&str>, image_data_url: Option<&str>) -> Self {
        Self {
            prompt: prompt.to_string(),
            image_url: non_blank(image_url.map(str::trim)),
            image_data_url: non_blank(image_data_url),
            force_fallback: None,
        }
    }

    /// Same payload with the forced-fallback marker set
    pub fn with_forced_fallback(&self) -> Self {
        Self {
            force_fallback: Some(true),
            ..self.clone()
        }
    }

    pub fn forces_fallback(&self) -> bool {
        self.force_fallback.unwrap_or(false)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Successful response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub fallback_used: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
}

impl AskReply {
    /// Parse a 2xx body; a JSON `null` counts as an empty reply
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let reply: Option<AskReply> = serde_json::from_str(body)?;
        Ok(reply.unwrap_or_default())
    }

    /// Raw markdown answer, `answer` preferred over `text`
    pub fn raw_answer(&self) -> &str {
        self.answer
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or("")
    }

    pub fn used_fallback(&self) -> bool {
        self.fallback_used.unwrap_or(false)
    }
}

/// Status and body of a completed round-trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Anything that can deliver an ask payload to the backend
#[async_trait]
pub trait AskTransport: Send + Sync {
    async fn post_ask(&self, payload: &AskPayload) -> Result<HttpReply, TransportError>;
}
