use std::cell::RefCell;
use std::rc::Rc;

use session::SessionUi;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UiSnapshot {
    pub(crate) level_text: String,
    pub(crate) score_text: String,
    pub(crate) retry_visible: bool,
    pub(crate) level_image_visible: bool,
}

/// Headless stand-in for the level overlay and retry button. Text changes
/// are logged; clones share the same widgets.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogUi {
    widgets: Rc<RefCell<UiSnapshot>>,
}

impl LogUi {
    pub(crate) fn snapshot(&self) -> UiSnapshot {
        self.widgets.borrow().clone()
    }

    pub(crate) fn retry_visible(&self) -> bool {
        self.widgets.borrow().retry_visible
    }
}

impl SessionUi for LogUi {
    fn set_level_text(&mut self, text: &str) {
        let mut widgets = self.widgets.borrow_mut();
        if widgets.level_text != text {
            info!(text, "ui_level_text");
            widgets.level_text = text.to_string();
        }
    }

    fn set_score_text(&mut self, text: &str) {
        let mut widgets = self.widgets.borrow_mut();
        if widgets.score_text != text {
            if !text.is_empty() {
                info!(text, "ui_score_text");
            }
            widgets.score_text = text.to_string();
        }
    }

    fn set_retry_visible(&mut self, visible: bool) {
        self.widgets.borrow_mut().retry_visible = visible;
    }

    fn set_level_image_visible(&mut self, visible: bool) {
        self.widgets.borrow_mut().level_image_visible = visible;
    }
}
