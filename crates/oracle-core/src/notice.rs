//! Transient, auto-dismissing user notices (toasts)

use std::time::Duration;

pub const EMPTY_PROMPT: &str = "Please enter a prompt!";
pub const COOLDOWN_RETRYING: &str = "Training arc cooldown. Trying fallback...";
pub const STILL_COOLING: &str = "Still cooling down. Try again in a moment!";
pub const FALLBACK_USED: &str = "Primary cooling down. Switched to fallback.";
pub const UPSTREAM_FALLBACK: &str = "Upstream jutsu failed. Try again!";
pub const NETWORK_FALLBACK: &str = "Network gremlins. Check your chakra.";

const DEFAULT_DURATION_MS: u64 = 3200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warn,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Warn => "warn",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            duration: Duration::from_millis(DEFAULT_DURATION_MS),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    /// Override how long the notice stays on screen
    pub fn lasting(mut self, millis: u64) -> Self {
        self.duration = Duration::from_millis(millis);
        self
    }
}
