//! Conversation Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Invalid conversation id: {0}")]
    InvalidId(String),

    #[error("Conversation not found: {0}")]
    NotFound(String),
}
