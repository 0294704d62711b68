pub trait SessionUi {
    fn set_level_text(&mut self, text: &str);
    fn set_score_text(&mut self, text: &str);
    fn set_retry_visible(&mut self, visible: bool);
    fn set_level_image_visible(&mut self, visible: bool);
}
