use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Failed to save configuration: {0}")]
    Save(String),

    #[error("Cannot {action} while editor is {state}")]
    InvalidTransition { action: &'static str, state: String },

    #[error("Reset token is unknown or expired")]
    ResetToken,
}

pub type Result<T> = std::result::Result<T, EditorError>;
