use arboard::Clipboard;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(String);

impl From<arboard::Error> for ClipboardError {
    fn from(e: arboard::Error) -> Self {
        ClipboardError(e.to_string())
    }
}

/// Where copied token ids go, and where Ctrl+V reads from.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;

    fn get_text(&mut self) -> Result<String, ClipboardError>;
}

/// The OS clipboard. A fresh handle is opened per operation.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        Clipboard::new()?.set_text(text.to_owned())?;
        Ok(())
    }

    fn get_text(&mut self) -> Result<String, ClipboardError> {
        Ok(Clipboard::new()?.get_text()?)
    }
}
