pub mod api;
pub mod config;
pub mod controller;
pub mod csrf;
pub mod error;
pub mod markdown;
pub mod notice;
pub mod session;
pub mod theme;
pub mod upload;

// Re-export main types for convenience
pub use api::{AskPayload, AskReply, AskTransport, HttpReply, OracleClient};
pub use config::Config;
pub use controller::{Answer, AskController, AskView, Rendered};
pub use error::{AskError, TransportError};
pub use markdown::MarkdownRenderer;
pub use notice::{Notice, NoticeKind};
pub use session::{Session, UploadSink};
pub use theme::Theme;
