//! Error types for prompt-vault
//!
//! This module defines the error taxonomy shared by the store, the service
//! layer and the command dispatch surface. Every error is recoverable: the
//! caller (UI or CLI) decides whether to display it and continue.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for prompt-vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Main error type for prompt-vault
#[derive(Debug, Error)]
pub enum VaultError {
    /// Business rule violated before any storage access
    #[error("Validation error: {0}")]
    Validation(String),

    /// No record stored under this ID (or no prompts namespace yet)
    #[error("Prompt not found: {0}")]
    NotFound(i64),

    /// Record encode/decode error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage engine error; the enclosing transaction has been rolled back
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Store file is held by another process
    #[error("Database is locked by another process: {}", .0.display())]
    StoreLocked(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Platform clipboard unavailable or failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command not found in registry
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// Invalid command arguments
    #[error("Invalid arguments for command '{command}': {reason}")]
    InvalidArgs { command: String, reason: String },

    /// Generic error (catch-all)
    #[error("{0}")]
    Other(String),
}

impl From<String> for VaultError {
    fn from(err: String) -> Self {
        VaultError::Other(err)
    }
}

impl From<&str> for VaultError {
    fn from(err: &str) -> Self {
        VaultError::Other(err.to_string())
    }
}

impl VaultError {
    /// Build an `InvalidArgs` error for a dispatch command
    pub fn invalid_args(command: &str, reason: impl Into<String>) -> Self {
        VaultError::InvalidArgs {
            command: command.to_string(),
            reason:  reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::NotFound(_))
    }

    /// Get user-friendly error message for display in a UI
    pub fn user_message(&self) -> String {
        match self {
            VaultError::CommandNotFound(cmd) => {
                format!(
                    "Command '{}' not found. Run `prompt-vault call --list` for available commands.",
                    cmd
                )
            },
            VaultError::NotFound(id) => format!("No prompt with ID {}", id),
            VaultError::Clipboard(msg) => {
                format!(
                    "Could not copy to clipboard: {} (is a desktop session running?)",
                    msg
                )
            },
            VaultError::StoreLocked(path) => {
                format!(
                    "{} is open in another prompt-vault process; close it and retry.",
                    path.display()
                )
            },
            _ => self.to_string(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            VaultError::Validation(_) => "validation",
            VaultError::NotFound(_) => "not_found",
            VaultError::Serialization(_) => "serialization",
            VaultError::Database(_) => "database",
            VaultError::StoreLocked(_) => "locked",
            VaultError::Io(_) => "io",
            VaultError::Clipboard(_) => "clipboard",
            VaultError::Config(_) => "config",
            VaultError::CommandNotFound(_) => "command",
            VaultError::InvalidArgs { .. } => "arguments",
            VaultError::Other(_) => "other",
        }
    }
}
