//! Clipboard bridge
//!
//! The system implementation goes through `arboard`. A headless box has no
//! clipboard, so every copy there fails with [`VaultError::Clipboard`].

use std::sync::Mutex;

use crate::db::prompts::Prompt;
use crate::errors::{Result, VaultError};

/// Something that can receive copied text
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Copy a prompt's content
pub fn copy_to_clipboard(clipboard: &dyn Clipboard, prompt: &Prompt) -> Result<()> {
    clipboard.write_text(&prompt.prompt_content)?;
    tracing::debug!(id = prompt.id, "copied prompt to clipboard");
    Ok(())
}

fn clipboard_error(context: &str, err: arboard::Error) -> VaultError {
    VaultError::Clipboard(format!("{}: {}", context, err))
}

/// OS clipboard
///
/// The `arboard` handle is opened on first use and kept, since on X11 the
/// copied text is only served while the handle is alive. A failed write
/// drops the handle so the next copy reconnects.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_connected(&self) -> bool {
        self.handle.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut guard = self
            .handle
            .lock()
            .map_err(|_| VaultError::Clipboard("clipboard mutex poisoned".into()))?;

        let mut clipboard = match guard.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().map_err(|e| clipboard_error("Clipboard unavailable", e))?,
        };

        clipboard
            .set_text(text.to_owned())
            .map_err(|e| clipboard_error("Failed to set clipboard", e))?;
        *guard = Some(clipboard);
        Ok(())
    }
}

/// In-memory clipboard for tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text written, if any
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut guard = self
            .contents
            .lock()
            .map_err(|_| VaultError::Clipboard("clipboard mutex poisoned".into()))?;
        *guard = Some(text.to_string());
        Ok(())
    }
}
