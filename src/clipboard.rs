//! Copying the rendered description to the system clipboard.

use crate::error::{RepoMvpError, Result};

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard.
pub struct SystemClipboard(arboard::Clipboard);

impl SystemClipboard {
    pub fn open() -> Result<Self> {
        arboard::Clipboard::new()
            .map(Self)
            .map_err(|e| RepoMvpError::Other(format!("Clipboard unavailable: {e}")))
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.0
            .set_text(text)
            .map_err(|e| RepoMvpError::Other(format!("Clipboard write failed: {e}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyFeedback {
    Copied,
    Failed,
}

impl CopyFeedback {
    pub fn label(self) -> &'static str {
        match self {
            CopyFeedback::Copied => "✅ Copied!",
            CopyFeedback::Failed => "❌ Failed",
        }
    }
}

/// Copy `description` exactly as rendered. Failure is reported, never raised.
pub fn copy_description(clipboard: &mut dyn Clipboard, description: &str) -> CopyFeedback {
    match clipboard.set_text(description) {
        Ok(()) => CopyFeedback::Copied,
        Err(e) => {
            tracing::warn!(error = %e, "Copy to clipboard failed");
            CopyFeedback::Failed
        }
    }
}
