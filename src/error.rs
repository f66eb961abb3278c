use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid submission: {0}")]
    InvalidBatch(String),

    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email message error: {0}")]
    EmailMessage(#[from] lettre::error::Error),

    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl<T> From<std::sync::PoisonError<T>> for RegistryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        RegistryError::LockPoisoned(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
