use thiserror::Error;

use crate::types::MessageStatus;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Mail transport error: {0}")]
    Mail(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition {
        from: MessageStatus,
        to: MessageStatus,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
