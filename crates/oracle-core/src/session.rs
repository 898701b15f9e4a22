//! UI-scoped view-model shared between the upload widget and the ask flow

/// Capability implemented by anything that receives upload widget events
pub trait UploadSink {
    fn on_file_added(&mut self, data_url: String);
    fn on_file_removed(&mut self);
}

/// Per-interaction state read by the ask controller
#[derive(Debug, Clone, Default)]
pub struct Session {
    uploaded_image_data_url: Option<String>,
    request_in_flight: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploaded_image_data_url(&self) -> Option<&str> {
        self.uploaded_image_data_url.as_deref()
    }

    pub fn has_upload(&self) -> bool {
        self.uploaded_image_data_url.is_some()
    }

    pub fn request_in_flight(&self) -> bool {
        self.request_in_flight
    }

    pub(crate) fn set_request_in_flight(&mut self, in_flight: bool) {
        self.request_in_flight = in_flight;
    }
}

impl UploadSink for Session {
    fn on_file_added(&mut self, data_url: String) {
        // An empty read counts as no file
        self.uploaded_image_data_url = if data_url.is_empty() { None } else { Some(data_url) };
    }

    fn on_file_removed(&mut self) {
        self.uploaded_image_data_url = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_file() {
        let mut session = Session::new();
        assert!(!session.has_upload());

        session.on_file_added("data:image/png;base64,AA==".to_string());
        assert_eq!(session.uploaded_image_data_url(), Some("data:image/png;base64,AA=="));

        session.on_file_removed();
        assert!(session.uploaded_image_data_url().is_none());
    }

    #[test]
    fn test_empty_data_url_clears() {
        let mut session = Session::new();
        session.on_file_added("data:a".to_string());
        session.on_file_added(String::new());
        assert!(!session.has_upload());
    }

    #[test]
    fn test_starts_idle() {
        assert!(!Session::new().request_in_flight());
    }
}
