//! Error taxonomy for the ask flow
//!
//! Every variant is handled inside the submission itself and turned into a
//! transient notice; callers only see it as the returned outcome.

use thiserror::Error;

use crate::notice::{Notice, EMPTY_PROMPT, NETWORK_FALLBACK, STILL_COOLING};

/// Outcome of a failed submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AskError {
    /// Prompt was empty after trimming; nothing was sent
    #[error("{}", EMPTY_PROMPT)]
    EmptyPrompt,

    /// Both the primary attempt and the forced-fallback retry returned 429
    #[error("{}", STILL_COOLING)]
    RateLimited,

    /// Non-2xx, non-429 response; `message` is the truncated body
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The request could not be completed or its body could not be parsed
    #[error("{0}")]
    Transport(String),
}

impl AskError {
    /// The notice shown to the user for this error
    pub fn notice(&self) -> Notice {
        match self {
            AskError::EmptyPrompt => Notice::info(EMPTY_PROMPT),
            AskError::RateLimited => Notice::warn(STILL_COOLING).lasting(4200),
            AskError::Upstream { message, .. } => Notice::error(message.clone()),
            AskError::Transport(message) => Notice::error(message.clone()),
        }
    }
}

/// A round-trip to the backend that did not complete
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Message suitable for display, never empty
    pub fn display_message(&self) -> String {
        let trimmed = self.message.trim();
        if trimmed.is_empty() {
            NETWORK_FALLBACK.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}
