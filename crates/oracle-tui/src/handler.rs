use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use oracle_core::Notice;

use crate::app::{App, Field};
use crate::tui::AppEvent;

const SCROLL_STEP: u16 = 3;
const PAGE_STEP: u16 = 10;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => {
            // Pasted newlines only make sense in the prompt
            let text = if app.focus == Field::Prompt {
                text.replace("\r\n", "\n")
            } else {
                text.replace(['\r', '\n'], "")
            };
            app.focused_input().insert_str(&text);
        }
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char('t') => app.toggle_theme(),
            KeyCode::Char('y') => copy_answer(app),
            KeyCode::Char('l') => app.clear(),
            KeyCode::Char('x') => {
                app.remove_attachment();
                app.push_notice(Notice::info("Attachment removed"));
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::F(n @ 1..=4) => app.add_chip(usize::from(n - 1)),
        KeyCode::PageDown => app.scroll_answer_down(PAGE_STEP),
        KeyCode::PageUp => app.scroll_answer_up(PAGE_STEP),

        KeyCode::Enter => match app.focus {
            Field::Prompt if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
                app.prompt.insert('\n');
            }
            Field::Prompt | Field::ImageUrl => app.submit(),
            Field::Attachment => app.attach().await,
        },

        KeyCode::Backspace => app.focused_input().backspace(),
        KeyCode::Delete => app.focused_input().delete(),
        KeyCode::Left => app.focused_input().left(),
        KeyCode::Right => app.focused_input().right(),
        KeyCode::Home => app.focused_input().home(),
        KeyCode::End => app.focused_input().end(),
        KeyCode::Char(c) => app.focused_input().insert(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_answer_down(SCROLL_STEP),
        MouseEventKind::ScrollUp => app.scroll_answer_up(SCROLL_STEP),
        _ => {}
    }
}

fn copy_answer(app: &mut App) {
    let text = app.answer_text();
    if text.is_empty() {
        app.push_notice(Notice::info("Nothing to copy!"));
        return;
    }

    if copy_to_clipboard(&text) {
        app.push_notice(Notice::info("Copied!"));
    } else {
        app.push_notice(Notice::info("Copy failed"));
    }
}

/// Pipe text into the first clipboard tool that accepts it
fn copy_to_clipboard(text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    const TOOLS: [&[&str]; 3] = [&["pbcopy"], &["wl-copy"], &["xclip", "-selection", "clipboard"]];

    for tool in TOOLS {
        let Ok(mut child) = Command::new(tool[0])
            .args(&tool[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };

        let written = child
            .stdin
            .take()
            .map(|mut stdin| stdin.write_all(text.as_bytes()).is_ok())
            .unwrap_or(false);

        if written && child.wait().map(|s| s.success()).unwrap_or(false) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use oracle_core::{AskController, OracleClient, Rendered, Theme};
    use tokio::sync::mpsc;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let controller = AskController::new(OracleClient::new("http://127.0.0.1:9"));
        App::new(controller, tx, Theme::Light)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c), KeyModifiers::NONE)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_typing_goes_to_focused_field() {
        let mut app = test_app();
        type_text(&mut app, "hi").await;
        handle_event(&mut app, key(KeyCode::Tab, KeyModifiers::NONE)).await.unwrap();
        type_text(&mut app, "url").await;

        assert_eq!(app.prompt.value, "hi");
        assert_eq!(app.image_url.value, "url");
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline() {
        let mut app = test_app();
        type_text(&mut app, "a").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::SHIFT)).await.unwrap();
        type_text(&mut app, "b").await;

        assert_eq!(app.prompt.value, "a\nb");
        assert!(app.can_submit());
    }

    #[tokio::test]
    async fn test_enter_submits_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = AskController::new(OracleClient::new("http://127.0.0.1:9"));
        let mut app = App::new(controller, tx, Theme::Light);

        // Blank prompt: the task only emits a validation notice and finishes
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await.unwrap();
        assert!(!app.can_submit());
        // Ignored while the first submission is alive
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await.unwrap();

        assert!(matches!(rx.recv().await, Some(crate::view::ViewEvent::Notice(_))));
        assert_eq!(rx.recv().await, Some(crate::view::ViewEvent::Done));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_function_keys_add_chips() {
        let mut app = test_app();
        handle_event(&mut app, key(KeyCode::F(2), KeyModifiers::NONE)).await.unwrap();
        assert_eq!(app.prompt.value, crate::app::HELPER_CHIPS[1]);
    }

    #[tokio::test]
    async fn test_paste_strips_newlines_outside_prompt() {
        let mut app = test_app();
        app.focus = Field::ImageUrl;
        handle_event(&mut app, AppEvent::Paste("https://a/\nb.png".to_string())).await.unwrap();
        assert_eq!(app.image_url.value, "https://a/b.png");
    }

    #[tokio::test]
    async fn test_copy_without_answer() {
        let mut app = test_app();
        handle_event(&mut app, key(KeyCode::Char('y'), KeyModifiers::CONTROL)).await.unwrap();
        assert_eq!(app.notices.last().unwrap().notice.message, "Nothing to copy!");
    }

    #[tokio::test]
    async fn test_ctrl_l_clears() {
        let mut app = test_app();
        type_text(&mut app, "q").await;
        app.answer = Some(Rendered::Text("a".to_string()));
        handle_event(&mut app, key(KeyCode::Char('l'), KeyModifiers::CONTROL)).await.unwrap();

        assert!(app.prompt.value.is_empty());
        assert!(app.answer.is_none());
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = test_app();
        handle_event(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL)).await.unwrap();
        assert!(app.should_quit);
    }
}
