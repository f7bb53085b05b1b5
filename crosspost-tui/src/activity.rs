use ratatui::style::Style;

/// One entry in the activity log pane.
#[derive(Debug, Clone)]
pub struct ActivityLine {
    pub text: String,
    pub style: Style,
}

impl ActivityLine {
    pub fn new(text: String, style: Style) -> Self {
        Self { text, style }
    }
}
