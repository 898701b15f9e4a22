use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use oracle_core::upload;
use oracle_core::{AskController, Config, Notice, OracleClient, Rendered, Session, Theme, UploadSink};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::view::{ChannelView, ViewEvent};

/// Canned prompt fragments bound to F1..F4
pub const HELPER_CHIPS: [&str; 4] = [
    "No spoilers please.",
    "Recommend similar titles.",
    "Explain like I'm new to anime.",
    "Answer in bullet points.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Prompt,
    ImageUrl,
    Attachment,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Prompt => Field::ImageUrl,
            Field::ImageUrl => Field::Attachment,
            Field::Attachment => Field::Prompt,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Field::Prompt => Field::Attachment,
            Field::ImageUrl => Field::Prompt,
            Field::Attachment => Field::ImageUrl,
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single text field with a character cursor
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.len();
    }

    pub fn set(&mut self, value: String) {
        self.cursor = value.chars().count();
        self.value = value;
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }
}

/// Append a helper chip the way the chip buttons do
pub fn append_chip(prompt: &str, chip: &str) -> String {
    format!("{} {}", prompt, chip).trim().to_string()
}

#[derive(Debug, Clone)]
pub struct ActiveNotice {
    pub notice: Notice,
    pub expires_at: Instant,
}

pub struct App {
    pub should_quit: bool,
    pub focus: Field,
    pub theme: Theme,

    // Inputs
    pub prompt: TextInput,
    pub image_url: TextInput,
    pub attachment: TextInput,
    pub attachment_name: Option<String>,

    // Ask state
    pub session: Session,
    pub answer: Option<Rendered>,
    pub answer_scroll: u16,
    pub loading: bool,
    pub ask_task: Option<JoinHandle<()>>,
    pub notices: Vec<ActiveNotice>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    controller: Arc<AskController<OracleClient>>,
    view_tx: UnboundedSender<ViewEvent>,
}

impl App {
    pub fn new(
        controller: AskController<OracleClient>,
        view_tx: UnboundedSender<ViewEvent>,
        theme: Theme,
    ) -> Self {
        Self {
            should_quit: false,
            focus: Field::Prompt,
            theme,
            prompt: TextInput::default(),
            image_url: TextInput::default(),
            attachment: TextInput::default(),
            attachment_name: None,
            session: Session::new(),
            answer: None,
            answer_scroll: 0,
            loading: false,
            ask_task: None,
            notices: Vec::new(),
            animation_frame: 0,
            controller: Arc::new(controller),
            view_tx,
        }
    }

    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        if let Some(prompt) = prompt {
            self.prompt = TextInput::with_value(&prompt);
        }
        self
    }

    pub fn base_url(&self) -> &str {
        self.controller.transport().base_url()
    }

    /// The submit control is disabled while a request task is alive
    pub fn can_submit(&self) -> bool {
        self.ask_task.is_none()
    }

    pub fn submit(&mut self) {
        if !self.can_submit() {
            return;
        }

        let controller = self.controller.clone();
        let mut session = self.session.clone();
        let mut view = ChannelView::new(self.view_tx.clone());
        let prompt = self.prompt.value.clone();
        let image_url = self.image_url.value.clone();

        self.ask_task = Some(tokio::spawn(async move {
            let _ = controller.submit(&mut session, &mut view, &prompt, &image_url).await;
            view.finish();
        }));
    }

    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::ShowLoading => {
                self.loading = true;
            }
            ViewEvent::HideLoading => {
                self.loading = false;
            }
            ViewEvent::Notice(notice) => self.push_notice(notice),
            ViewEvent::Answer(answer) => {
                self.answer = Some(answer);
                self.answer_scroll = 0;
            }
            ViewEvent::Done => {
                self.ask_task = None;
            }
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        tracing::debug!(kind = notice.kind.as_str(), "notice: {}", notice.message);
        let expires_at = Instant::now() + notice.duration;
        self.notices.push(ActiveNotice { notice, expires_at });
    }

    pub fn prune_notices(&mut self, now: Instant) {
        self.notices.retain(|n| n.expires_at > now);
    }

    pub fn tick_animation(&mut self) {
        self.prune_notices(Instant::now());
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else {
            self.animation_frame = 0;
        }
    }

    pub fn add_chip(&mut self, index: usize) {
        if let Some(chip) = HELPER_CHIPS.get(index) {
            let combined = append_chip(&self.prompt.value, chip);
            self.prompt.set(combined);
        }
    }

    pub async fn attach(&mut self) {
        let raw = self.attachment.value.trim().to_string();
        if raw.is_empty() {
            self.remove_attachment();
            return;
        }

        let path = Path::new(&raw);
        match upload::attach_file(&mut self.session, path).await {
            Ok(()) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or(raw.clone());
                self.push_notice(Notice::info(format!("Attached {}", name)));
                self.attachment_name = Some(name);
            }
            Err(e) => {
                tracing::warn!("attach failed: {:#}", e);
                self.push_notice(Notice::error(e.to_string()));
            }
        }
    }

    pub fn remove_attachment(&mut self) {
        self.session.on_file_removed();
        self.attachment_name = None;
        self.attachment.clear();
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        if let Err(e) = Config::save_theme(self.theme) {
            tracing::warn!("could not persist theme: {}", e);
        }
    }

    /// Plain text of the current answer, if any
    pub fn answer_text(&self) -> String {
        self.answer
            .as_ref()
            .map(|a| a.as_str().trim().to_string())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.prompt.clear();
        self.image_url.clear();
        self.answer = None;
        self.answer_scroll = 0;
    }

    pub fn focused_input(&mut self) -> &mut TextInput {
        match self.focus {
            Field::Prompt => &mut self.prompt,
            Field::ImageUrl => &mut self.image_url,
            Field::Attachment => &mut self.attachment,
        }
    }

    pub fn scroll_answer_down(&mut self, lines: u16) {
        self.answer_scroll = self.answer_scroll.saturating_add(lines);
    }

    pub fn scroll_answer_up(&mut self, lines: u16) {
        self.answer_scroll = self.answer_scroll.saturating_sub(lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_core::NoticeKind;
    use std::io::Write;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = AskController::new(OracleClient::new("http://127.0.0.1:9"));
        (App::new(controller, tx, Theme::Light), rx)
    }

    #[test]
    fn test_append_chip_trims() {
        assert_eq!(append_chip("", "No spoilers please."), "No spoilers please.");
        assert_eq!(append_chip("Who is Levi?", "Be brief."), "Who is Levi? Be brief.");
    }

    #[test]
    fn test_text_input_utf8_editing() {
        let mut input = TextInput::with_value("héllo");
        input.left();
        input.left();
        input.insert('X');
        assert_eq!(input.value, "hélXlo");
        input.home();
        input.delete();
        assert_eq!(input.value, "élXlo");
        input.end();
        input.backspace();
        assert_eq!(input.value, "élXl");
    }

    #[test]
    fn test_field_cycle() {
        assert_eq!(Field::Prompt.next().next().next(), Field::Prompt);
        assert_eq!(Field::Prompt.prev(), Field::Attachment);
    }

    #[tokio::test]
    async fn test_view_events_drive_state() {
        let (mut app, _rx) = test_app();
        app.ask_task = Some(tokio::spawn(async {}));
        assert!(!app.can_submit());

        app.apply(ViewEvent::ShowLoading);
        assert!(app.loading);
        app.apply(ViewEvent::Notice(Notice::warn("cooling")));
        app.apply(ViewEvent::Answer(Rendered::Text("answer".to_string())));
        app.apply(ViewEvent::HideLoading);
        app.apply(ViewEvent::Done);

        assert!(!app.loading);
        assert!(app.can_submit());
        assert_eq!(app.answer_text(), "answer");
        assert_eq!(app.notices.len(), 1);
        assert_eq!(app.notices[0].notice.kind, NoticeKind::Warn);
    }

    #[tokio::test]
    async fn test_blank_submit_round_trip() {
        let (mut app, mut rx) = test_app();
        app.prompt.set("   ".to_string());
        app.submit();
        assert!(!app.can_submit());

        // Validation fails before any network call: one notice, then done
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, ViewEvent::Notice(ref n) if n.message == "Please enter a prompt!"));
        let second = rx.recv().await.unwrap();
        assert_eq!(second, ViewEvent::Done);

        app.apply(first);
        app.apply(second);
        assert!(app.can_submit());
        assert!(!app.loading);
    }

    #[test]
    fn test_notices_expire() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let controller = AskController::new(OracleClient::new("http://127.0.0.1:9"));
        let mut app = App::new(controller, tx, Theme::Dark);

        app.push_notice(Notice::info("short").lasting(10));
        app.push_notice(Notice::info("long").lasting(60_000));

        app.prune_notices(Instant::now() + Duration::from_millis(50));
        assert_eq!(app.notices.len(), 1);
        assert_eq!(app.notices[0].notice.message, "long");
    }

    #[test]
    fn test_chips_append_to_prompt() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let controller = AskController::new(OracleClient::new("http://127.0.0.1:9"));
        let mut app = App::new(controller, tx, Theme::Light).with_prompt(Some("Best mecha?".to_string()));

        app.add_chip(0);
        assert_eq!(app.prompt.value, format!("Best mecha? {}", HELPER_CHIPS[0]));
        app.add_chip(99);
        assert_eq!(app.prompt.value, format!("Best mecha? {}", HELPER_CHIPS[0]));
    }

    #[tokio::test]
    async fn test_attach_and_remove() {
        let (mut app, _rx) = test_app();
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"png").unwrap();

        app.attachment.set(file.path().display().to_string());
        app.attach().await;
        assert!(app.session.has_upload());
        assert!(app.attachment_name.is_some());

        app.remove_attachment();
        assert!(!app.session.has_upload());
        assert!(app.attachment.value.is_empty());
    }

    #[tokio::test]
    async fn test_attach_missing_file_reports_error() {
        let (mut app, _rx) = test_app();
        app.attachment.set("/definitely/not/here.png".to_string());
        app.attach().await;

        assert!(!app.session.has_upload());
        assert_eq!(app.notices.last().unwrap().notice.kind, NoticeKind::Error);
    }

    #[test]
    fn test_clear_resets_inputs_and_answer() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let controller = AskController::new(OracleClient::new("http://127.0.0.1:9"));
        let mut app = App::new(controller, tx, Theme::Light).with_prompt(Some("q".to_string()));
        app.image_url.set("u".to_string());
        app.answer = Some(Rendered::Text("a".to_string()));

        app.clear();
        assert!(app.prompt.value.is_empty());
        assert!(app.image_url.value.is_empty());
        assert!(app.answer.is_none());
    }
}
