use serde::{Deserialize, Serialize};

use crate::backend::EncodeResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    Ids,
    #[default]
    Text,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Ids => DisplayMode::Text,
            DisplayMode::Text => DisplayMode::Ids,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    EncodeInput,
    DecodeInput,
    TokenPane,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::EncodeInput => Focus::DecodeInput,
            Focus::DecodeInput => Focus::TokenPane,
            Focus::TokenPane => Focus::EncodeInput,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::EncodeInput => Focus::TokenPane,
            Focus::DecodeInput => Focus::EncodeInput,
            Focus::TokenPane => Focus::DecodeInput,
        }
    }
}

/// Cross-cutting UI state. Theme, display mode and the last encode result
/// only change through the named transitions below.
#[derive(Debug, Default)]
pub struct UIState {
    theme: Theme,
    display_mode: DisplayMode,
    last_encode_result: Option<EncodeResult>,

    // Editable fields and focus
    pub focus: Focus,
    pub encode_input: String,
    pub decode_input: String,
}

impl UIState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn last_encode_result(&self) -> Option<&EncodeResult> {
        self.last_encode_result.as_ref()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    /// Replace the previous result wholesale.
    pub fn record_encode_result(&mut self, result: EncodeResult) {
        self.last_encode_result = Some(result);
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::EncodeInput => Some(&mut self.encode_input),
            Focus::DecodeInput => Some(&mut self.decode_input),
            Focus::TokenPane => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = UIState::new();
        assert_eq!(state.theme(), Theme::Light);
        assert_eq!(state.display_mode(), DisplayMode::Text);
        assert!(state.last_encode_result().is_none());
        assert_eq!(state.focus, Focus::EncodeInput);
    }

    #[test]
    fn test_record_replaces_result() {
        let mut state = UIState::new();
        state.record_encode_result(EncodeResult::new(vec![1, 2], vec!["a".into(), "b".into()]).unwrap());
        state.record_encode_result(EncodeResult::new(vec![9], vec!["z".into()]).unwrap());

        let result = state.last_encode_result().unwrap();
        assert_eq!(result.token_ids(), &[9]);
        assert_eq!(result.token_texts(), &["z".to_string()]);
    }

    #[test]
    fn test_focus_cycle_is_closed() {
        let start = Focus::EncodeInput;
        assert_eq!(start.next().next().next(), start);
        assert_eq!(start.previous().previous().previous(), start);
        assert_eq!(start.next().previous(), start);
    }

    #[test]
    fn test_theme_serde_names() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!(serde_json::from_str::<Theme>("\"light\"").unwrap(), Theme::Light);
    }

    #[test]
    fn test_focused_input_mut() {
        let mut state = UIState::new();
        state.focused_input_mut().unwrap().push_str("abc");
        assert_eq!(state.encode_input, "abc");

        state.focus = Focus::TokenPane;
        assert!(state.focused_input_mut().is_none());
    }
}
