use crate::ui_state::{DisplayMode, Focus};

/// User actions produced by key and mouse events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Submit the encode input
    Encode,
    /// Submit the decode input
    Decode,
    /// Flip between the ID and text views (the switch)
    ToggleDisplayMode,
    /// Show a specific view (the "Text" / "IDs" labels)
    ShowDisplayMode(DisplayMode),
    ToggleTheme,
    /// Put the last encoded ids into the decode input
    CopyToDecode,
    /// Copy one token's id to the clipboard
    CopyToken {
        view: DisplayMode,
        unit: usize,
    },
    CopySelectedToken,
    SelectNextToken,
    SelectPreviousToken,
    FocusNext,
    FocusPrevious,
    Focus(Focus),
    InsertChar(char),
    Backspace,
    ClearInput,
    Paste(String),
    PasteFromClipboard,
    DismissError,
    Quit,
}
