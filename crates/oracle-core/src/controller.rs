//! Ask-flow controller
//!
//! Owns one prompt submission: validation, the primary request, a single
//! forced-fallback retry on 429, rendering of the answer, and the loading
//! state around the whole thing. It talks to the network only through
//! [`AskTransport`] and to the screen only through [`AskView`], so it runs
//! the same under a terminal UI, a one-shot CLI or a test double.

use crate::api::{AskPayload, AskReply, AskTransport, HttpReply};
use crate::error::AskError;
use crate::markdown::MarkdownRenderer;
use crate::notice::{Notice, COOLDOWN_RETRYING, FALLBACK_USED, UPSTREAM_FALLBACK};
use crate::session::Session;

pub const NO_ANSWER: &str = "(no answer)";
const ERROR_BODY_LIMIT: usize = 300;

/// Answer content handed to the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Sanitized HTML produced by the markdown renderer
    Html(String),
    /// Plain text, shown verbatim
    Text(String),
}

impl Rendered {
    pub fn as_str(&self) -> &str {
        match self {
            Rendered::Html(s) | Rendered::Text(s) => s,
        }
    }
}

/// Presentation adapter driven by the controller
pub trait AskView {
    /// Disable the submit control and show the loading indicator
    fn show_loading(&mut self);
    /// Re-enable the submit control and hide the loading indicator
    fn hide_loading(&mut self);
    fn notify(&mut self, notice: Notice);
    fn render_answer(&mut self, answer: Rendered);
}

/// A successfully rendered answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub rendered: Rendered,
    pub fallback_used: bool,
    /// Requests sent, 1 or 2
    pub attempts: u8,
}

/// Loading state held for the duration of one submission.
///
/// Released on drop so every exit path restores the controls.
struct InFlight<'a, V: AskView + ?Sized> {
    session: &'a mut Session,
    view: &'a mut V,
}

impl<'a, V: AskView + ?Sized> InFlight<'a, V> {
    fn begin(session: &'a mut Session, view: &'a mut V) -> Self {
        session.set_request_in_flight(true);
        view.show_loading();
        Self { session, view }
    }

    fn notify(&mut self, notice: Notice) {
        emit(&mut *self.view, notice);
    }
}

impl<V: AskView + ?Sized> Drop for InFlight<'_, V> {
    fn drop(&mut self) {
        self.view.hide_loading();
        self.session.set_request_in_flight(false);
    }
}

fn emit<V: AskView + ?Sized>(view: &mut V, notice: Notice) {
    tracing::debug!(kind = notice.kind.as_str(), "notice: {}", notice.message);
    view.notify(notice);
}

pub struct AskController<T: AskTransport> {
    transport: T,
    markdown: Option<MarkdownRenderer>,
}

impl<T: AskTransport> AskController<T> {
    /// Controller that renders answers as plain text
    pub fn new(transport: T) -> Self {
        Self { transport, markdown: None }
    }

    /// Render answers through markdown + sanitizer
    pub fn with_markdown(mut self, renderer: MarkdownRenderer) -> Self {
        self.markdown = Some(renderer);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one submission. Notices have already been shown for any error
    /// returned here; the result is informational.
    pub async fn submit<V: AskView + ?Sized>(
        &self,
        session: &mut Session,
        view: &mut V,
        prompt: &str,
        image_url: &str,
    ) -> Result<Answer, AskError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            let err = AskError::EmptyPrompt;
            emit(view, err.notice());
            return Err(err);
        }

        let mut flight = InFlight::begin(session, view);

        let payload = AskPayload::new(
            prompt,
            Some(image_url),
            flight.session.uploaded_image_data_url(),
        );

        tracing::info!(
            "ask: len={}, image_url={}, image_data={}",
            prompt.chars().count(),
            payload.image_url.is_some(),
            payload.image_data_url.is_some()
        );

        let result = self.exchange(&payload, &mut flight).await;

        match &result {
            Ok(answer) => {
                tracing::info!(
                    "answered after {} attempt(s), fallback_used={}",
                    answer.attempts,
                    answer.fallback_used
                );
            }
            Err(err) => {
                tracing::warn!("ask failed: {}", err);
                flight.notify(err.notice());
            }
        }

        result
    }

    async fn exchange<V: AskView + ?Sized>(
        &self,
        payload: &AskPayload,
        flight: &mut InFlight<'_, V>,
    ) -> Result<Answer, AskError> {
        let mut attempts = 1;
        let mut reply = self.send(payload).await?;

        if reply.is_rate_limited() {
            tracing::warn!("primary rate limited, retrying with forced fallback");
            flight.notify(Notice::warn(COOLDOWN_RETRYING).lasting(3400));
            attempts += 1;
            reply = self.send(&payload.with_forced_fallback()).await?;
        }

        if reply.is_rate_limited() {
            return Err(AskError::RateLimited);
        }

        if !reply.is_success() {
            return Err(upstream_error(&reply));
        }

        let data = AskReply::parse(&reply.body).map_err(|e| AskError::Transport(e.to_string()))?;

        let fallback_used = data.used_fallback();
        if fallback_used {
            flight.notify(Notice::info(FALLBACK_USED));
        }

        let rendered = self.render(data.raw_answer());
        flight.view.render_answer(rendered.clone());

        Ok(Answer { rendered, fallback_used, attempts })
    }

    async fn send(&self, payload: &AskPayload) -> Result<HttpReply, AskError> {
        self.transport
            .post_ask(payload)
            .await
            .map_err(|e| AskError::Transport(e.display_message()))
    }

    fn render(&self, raw: &str) -> Rendered {
        match &self.markdown {
            Some(renderer) => {
                let html = renderer.render(raw);
                if html.trim().is_empty() {
                    Rendered::Text(NO_ANSWER.to_string())
                } else {
                    Rendered::Html(html)
                }
            }
            None if raw.is_empty() => Rendered::Text(NO_ANSWER.to_string()),
            None => Rendered::Text(raw.to_string()),
        }
    }
}

fn upstream_error(reply: &HttpReply) -> AskError {
    let message: String = reply.body.chars().take(ERROR_BODY_LIMIT).collect();
    let message = if message.is_empty() {
        UPSTREAM_FALLBACK.to_string()
    } else {
        message
    };

    AskError::Upstream { status: reply.status, message }
}
