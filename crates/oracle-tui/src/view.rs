//! Bridges the ask controller running in a background task to the UI loop

use oracle_core::{AskView, Notice, Rendered};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ShowLoading,
    HideLoading,
    Notice(Notice),
    Answer(Rendered),
    /// The submission task has returned
    Done,
}

/// `AskView` that forwards every call to the UI loop
pub struct ChannelView {
    tx: UnboundedSender<ViewEvent>,
}

impl ChannelView {
    pub fn new(tx: UnboundedSender<ViewEvent>) -> Self {
        Self { tx }
    }

    pub fn finish(&self) {
        self.send(ViewEvent::Done);
    }

    fn send(&self, event: ViewEvent) {
        // The UI loop going away means we are shutting down
        let _ = self.tx.send(event);
    }
}

impl AskView for ChannelView {
    fn show_loading(&mut self) {
        self.send(ViewEvent::ShowLoading);
    }

    fn hide_loading(&mut self) {
        self.send(ViewEvent::HideLoading);
    }

    fn notify(&mut self, notice: Notice) {
        self.send(ViewEvent::Notice(notice));
    }

    fn render_answer(&mut self, answer: Rendered) {
        self.send(ViewEvent::Answer(answer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_events_forwarded_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut view = ChannelView::new(tx);

        view.show_loading();
        view.notify(Notice::info("hey"));
        view.render_answer(Rendered::Text("a".to_string()));
        view.hide_loading();
        view.finish();

        assert_eq!(rx.try_recv().unwrap(), ViewEvent::ShowLoading);
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::Notice(Notice::info("hey")));
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::Answer(Rendered::Text("a".to_string())));
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::HideLoading);
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::Done);
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut view = ChannelView::new(tx);
        view.notify(Notice::error("nobody listening"));
    }
}
